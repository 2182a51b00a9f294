//! Navigation controller
//!
//! A page transition is only complete once the page has also reached a
//! known-ready state. The transition (wrapped in the retry policy) and the
//! ordered trigger sequence run as two tasks under a shared child
//! cancellation token; the controller returns when both have succeeded, on
//! the first error from either, on caller cancellation, or at the deadline.
//!
//! The deadline is the configured timeout plus every retry cooldown, so a
//! slow page cannot eat into the retry budget.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlResult, Transition, Trigger};
use super::retry::RetryPolicy;
use crate::browser::{BrowserError, BrowserTab, NavigationResponse, element_exists};
use crate::config::CrawlerConfig;

const TEXT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    retry: RetryPolicy,
    timeout: Duration,
}

impl Navigator {
    #[must_use]
    pub fn new(retry: RetryPolicy, timeout: Duration) -> Self {
        Self { retry, timeout }
    }

    #[must_use]
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(RetryPolicy::from_config(config), config.navigation_timeout())
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Upper bound on one `navigate_till_trigger` call
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.timeout + self.retry.total_backoff()
    }

    /// Perform `transition` on `tab` and wait until every trigger completed.
    ///
    /// With no triggers the transition's own result decides.
    ///
    /// # Errors
    ///
    /// The first error raised by either task, `CrawlError::Cancelled` when
    /// `cancel` fires, or `CrawlError::Timeout` at [`Navigator::deadline`].
    pub async fn navigate_till_trigger<T>(
        &self,
        tab: Arc<T>,
        transition: Transition,
        triggers: Vec<Trigger>,
        cancel: &CancellationToken,
    ) -> CrawlResult<NavigationResponse>
    where
        T: BrowserTab + ?Sized + 'static,
    {
        debug!("start navigation: {transition}");

        let child = cancel.child_token();
        let mut transition_task = tokio::spawn(run_transition(
            Arc::clone(&tab),
            transition,
            self.retry,
            child.clone(),
        ));
        let mut trigger_task = tokio::spawn(run_triggers(tab, triggers, child.clone()));

        let race = async {
            let mut response: Option<NavigationResponse> = None;
            let mut triggers_done = false;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => return Err(CrawlError::Cancelled),
                    joined = &mut transition_task, if response.is_none() => {
                        response = Some(flatten(joined)?);
                    }
                    joined = &mut trigger_task, if !triggers_done => {
                        flatten(joined)?;
                        triggers_done = true;
                    }
                }

                if triggers_done && let Some(response) = response {
                    return Ok(response);
                }
            }
        };

        let deadline = self.deadline();
        let outcome = match tokio::time::timeout(deadline, race).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout(deadline)),
        };

        child.cancel();
        transition_task.abort();
        trigger_task.abort();

        outcome
    }
}

fn flatten<V>(joined: Result<CrawlResult<V>, JoinError>) -> CrawlResult<V> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(CrawlError::Cancelled),
        Err(e) => Err(CrawlError::TaskFailed(e.to_string())),
    }
}

async fn run_transition<T>(
    tab: Arc<T>,
    transition: Transition,
    retry: RetryPolicy,
    cancel: CancellationToken,
) -> CrawlResult<NavigationResponse>
where
    T: BrowserTab + ?Sized,
{
    let tab: &T = &tab;
    let transition = &transition;

    let attempts = retry.run(transition.target(), &cancel, move || async move {
        let response = match transition {
            Transition::Navigate(url) => tab.navigate(url).await?,
            Transition::Click(selector) => tab.click_and_wait(selector).await?,
        };
        Ok::<_, CrawlError>(response)
    });

    tokio::select! {
        () = cancel.cancelled() => Err(CrawlError::Cancelled),
        result = attempts => result,
    }
}

async fn run_triggers<T>(
    tab: Arc<T>,
    triggers: Vec<Trigger>,
    cancel: CancellationToken,
) -> CrawlResult<()>
where
    T: BrowserTab + ?Sized,
{
    for (index, trigger) in triggers.iter().enumerate() {
        tokio::select! {
            () = cancel.cancelled() => return Err(CrawlError::Cancelled),
            result = run_trigger(&*tab, trigger) => result?,
        }
        debug!("trigger finished: order={}", index + 1);
    }
    Ok(())
}

async fn run_trigger<T>(tab: &T, trigger: &Trigger) -> CrawlResult<()>
where
    T: BrowserTab + ?Sized,
{
    match trigger {
        Trigger::WaitVisible(selector) => tab.wait_visible(selector).await?,
        Trigger::Delay(jitter) => tokio::time::sleep(jitter.sample()?).await,
        Trigger::WaitVisibleIf { probe, selectors } => {
            if element_exists(tab, probe).await? {
                for selector in selectors {
                    tab.wait_visible(selector).await?;
                }
            } else {
                debug!("probe {probe} absent, skipping conditional waits");
            }
        }
        Trigger::WaitText { selector, text } => wait_text(tab, selector, text).await?,
    }
    Ok(())
}

async fn wait_text<T>(tab: &T, selector: &str, expected: &str) -> CrawlResult<()>
where
    T: BrowserTab + ?Sized,
{
    loop {
        match tab.text(selector).await {
            Ok(text) if text.trim() == expected => return Ok(()),
            Ok(_) | Err(BrowserError::ElementNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        tokio::time::sleep(TEXT_POLL).await;
    }
}
