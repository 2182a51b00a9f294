//! Orchestrator-level page executor
//!
//! Every navigation the crawler performs goes through here: one rate-limit
//! token, one controlled transition, then a capture of the rendered document.

use std::sync::Arc;

use log::debug;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlResult, Transition, Trigger};
use super::navigation::Navigator;
use super::rate_limiter::NavigationRateLimiter;
use crate::browser::BrowserTab;
use crate::config::CrawlerConfig;

/// Root selector captured after each navigation
const DOCUMENT_SELECTOR: &str = "html";

#[derive(Debug)]
pub struct PageExecutor {
    navigator: Navigator,
    limiter: NavigationRateLimiter,
    cancel: CancellationToken,
}

impl PageExecutor {
    #[must_use]
    pub fn new(navigator: Navigator, limiter: NavigationRateLimiter, cancel: CancellationToken) -> Self {
        Self {
            navigator,
            limiter,
            cancel,
        }
    }

    #[must_use]
    pub fn from_config(config: &CrawlerConfig, cancel: CancellationToken) -> Self {
        Self::new(
            Navigator::from_config(config),
            NavigationRateLimiter::from_config(config),
            cancel,
        )
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn limiter(&self) -> &NavigationRateLimiter {
        &self.limiter
    }

    /// Rate-limited transition without capturing the page.
    ///
    /// # Errors
    ///
    /// Cancellation while waiting on the limiter, or any navigation error.
    pub async fn transition<T>(
        &self,
        tab: &Arc<T>,
        transition: Transition,
        triggers: Vec<Trigger>,
    ) -> CrawlResult<()>
    where
        T: BrowserTab + ?Sized + 'static,
    {
        self.limiter.acquire(&self.cancel).await?;
        self.navigator
            .navigate_till_trigger(Arc::clone(tab), transition, triggers, &self.cancel)
            .await?;
        Ok(())
    }

    /// Rate-limited transition followed by a capture of the whole document.
    ///
    /// # Errors
    ///
    /// See [`PageExecutor::transition`]; also fails when the document cannot
    /// be read back.
    pub async fn fetch<T>(
        &self,
        tab: &Arc<T>,
        transition: Transition,
        triggers: Vec<Trigger>,
    ) -> CrawlResult<String>
    where
        T: BrowserTab + ?Sized + 'static,
    {
        let target = transition.target().to_string();
        self.transition(tab, transition, triggers).await?;
        let html = tab.outer_html(DOCUMENT_SELECTOR).await?;
        debug!("Captured {} bytes from {}", html.len(), target);
        Ok(html)
    }
}
