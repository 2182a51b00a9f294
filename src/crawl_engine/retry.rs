//! Retry policy for page transitions
//!
//! Transient server errors (500, 502, 503, 504) are retried with a linearly
//! growing cooldown. Every other failure surfaces immediately.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlResult};
use crate::browser::NavigationResponse;
use crate::config::CrawlerConfig;

/// Statuses worth another attempt
const TRANSIENT_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// How an attempt's response is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Transient,
    Fatal,
}

/// Classify the primary document status of a transition.
///
/// A missing status means the transition produced no network response
/// (same-document navigation), which counts as success.
#[must_use]
pub fn classify_status(status: Option<u16>) -> StatusClass {
    match status {
        None => StatusClass::Success,
        Some(s) if (200..300).contains(&s) => StatusClass::Success,
        Some(s) if TRANSIENT_STATUSES.contains(&s) => StatusClass::Transient,
        Some(_) => StatusClass::Fatal,
    }
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_cooldown: Duration,
    step: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_cooldown: Duration, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_cooldown,
            step,
        }
    }

    #[must_use]
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.retries(),
            config.retry_base_cooldown(),
            config.retry_step(),
        )
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Cooldown after the failed attempt with 0-based index `attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_cooldown + self.step * (attempt + 1)
    }

    /// Sum of every cooldown the policy can sleep through before giving up.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts - 1).map(|attempt| self.backoff(attempt)).sum()
    }

    /// Run `action` until it yields an acceptable status or the budget runs out.
    ///
    /// `target` only labels errors and logs.
    ///
    /// # Errors
    ///
    /// - the action's own error, unchanged, on the first transport failure
    /// - `CrawlError::HttpStatus` for a non-retryable status
    /// - `CrawlError::RetriesExhausted` when every attempt was transient
    /// - `CrawlError::Cancelled` if `cancel` fires during a cooldown
    pub async fn run<F, Fut>(
        &self,
        target: &str,
        cancel: &CancellationToken,
        mut action: F,
    ) -> CrawlResult<NavigationResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CrawlResult<NavigationResponse>>,
    {
        let mut last_status = None;

        for attempt in 0..self.max_attempts {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let response = action().await?;
            match classify_status(response.status) {
                StatusClass::Success => {
                    debug!(
                        "Transition to {} succeeded on attempt {} (status {:?})",
                        target,
                        attempt + 1,
                        response.status
                    );
                    return Ok(response);
                }
                StatusClass::Fatal => {
                    return Err(CrawlError::HttpStatus {
                        status: response.status.unwrap_or_default(),
                        url: target.to_string(),
                    });
                }
                StatusClass::Transient => {
                    last_status = response.status;
                    if attempt + 1 == self.max_attempts {
                        break;
                    }

                    let cooldown = self.backoff(attempt);
                    warn!(
                        "Transient status {:?} for {} (attempt {}/{}), cooling down for {:?}",
                        response.status,
                        target,
                        attempt + 1,
                        self.max_attempts,
                        cooldown
                    );

                    tokio::select! {
                        () = cancel.cancelled() => return Err(CrawlError::Cancelled),
                        () = tokio::time::sleep(cooldown) => {}
                    }
                }
            }
        }

        Err(CrawlError::RetriesExhausted {
            attempts: self.max_attempts,
            last_status,
        })
    }
}
