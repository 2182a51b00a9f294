//! Core types for crawl operations
//!
//! Error taxonomy, page transitions, trigger actions and the run summary.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::extractors::ExtractError;
use crate::store::StoreError;

/// Top-level error for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Configuration rejected at build time
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Non-retryable HTTP status on the primary document
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Every attempt hit a transient server error
    #[error("Gave up after {attempts} attempts (last status: {last_status:?})")]
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("Navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Crawl operation was cancelled")]
    Cancelled,

    #[error("Invalid delay: base {base:?} is smaller than deviation {deviation:?}")]
    InvalidDelay { base: Duration, deviation: Duration },

    /// A helper task panicked or was aborted unexpectedly
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl CrawlError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Errors that must halt the run whatever the failure policy says.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Store(_) | Self::Config(_))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// The action that moves a tab to a new page state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Load a URL
    Navigate(String),
    /// Click an element and wait for whatever navigation it causes
    Click(String),
}

impl Transition {
    /// URL or selector, for logs and error messages
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Navigate(url) => url,
            Self::Click(selector) => selector,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate(url) => write!(f, "navigate({url})"),
            Self::Click(selector) => write!(f, "click({selector})"),
        }
    }
}

/// Randomized pause: uniform in `[base - deviation, base + deviation]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub base: Duration,
    pub deviation: Duration,
}

impl Jitter {
    #[must_use]
    pub const fn new(base: Duration, deviation: Duration) -> Self {
        Self { base, deviation }
    }

    /// Jitter from millisecond values.
    #[must_use]
    pub const fn millis(base: u64, deviation: u64) -> Self {
        Self::new(Duration::from_millis(base), Duration::from_millis(deviation))
    }

    /// Draw one concrete delay.
    ///
    /// # Errors
    ///
    /// `CrawlError::InvalidDelay` when `base < deviation`.
    pub fn sample(&self) -> CrawlResult<Duration> {
        if self.base < self.deviation {
            return Err(CrawlError::InvalidDelay {
                base: self.base,
                deviation: self.deviation,
            });
        }
        if self.deviation.is_zero() {
            return Ok(self.base);
        }

        let low = (self.base - self.deviation).as_millis() as u64;
        let high = (self.base + self.deviation).as_millis() as u64;
        let millis = rand::rng().random_range(low..=high);
        Ok(Duration::from_millis(millis))
    }
}

/// A readiness condition awaited after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Wait until the selector matches a visible element
    WaitVisible(String),
    /// Sleep for a randomized delay
    Delay(Jitter),
    /// If `probe` matches an element, wait for each of `selectors` in order;
    /// otherwise complete immediately
    WaitVisibleIf {
        probe: String,
        selectors: Vec<String>,
    },
    /// Wait until the selector's trimmed text equals `text`
    WaitText { selector: String, text: String },
}

impl Trigger {
    #[must_use]
    pub fn wait_visible(selector: impl Into<String>) -> Self {
        Self::WaitVisible(selector.into())
    }

    #[must_use]
    pub const fn delay(jitter: Jitter) -> Self {
        Self::Delay(jitter)
    }

    #[must_use]
    pub fn wait_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::WaitText {
            selector: selector.into(),
            text: text.into(),
        }
    }
}

/// Granularity at which a failure can be skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    MembersPage,
    User,
    Movie,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MembersPage => write!(f, "members page"),
            Self::User => write!(f, "user"),
            Self::Movie => write!(f, "movie"),
        }
    }
}

/// A unit of work abandoned under `FailurePolicy::SkipUnit`
#[derive(Debug, Clone, Serialize)]
pub struct FailedUnit {
    pub kind: UnitKind,
    pub url: String,
    pub error: String,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub members_pages: u32,
    pub users: u32,
    pub movies_scraped: u32,
    pub movies_skipped: u32,
    pub activities: u32,
    pub failed: Vec<FailedUnit>,
}

impl CrawlSummary {
    pub(crate) fn record_failure(&mut self, kind: UnitKind, url: &str, error: &CrawlError) {
        self.failed.push(FailedUnit {
            kind,
            url: url.to_string(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_within_bounds() {
        let jitter = Jitter::millis(2000, 300);
        for _ in 0..200 {
            let d = jitter.sample().expect("valid jitter");
            assert!(d >= Duration::from_millis(1700));
            assert!(d <= Duration::from_millis(2300));
        }
    }

    #[test]
    fn test_jitter_rejects_deviation_above_base() {
        let err = Jitter::millis(100, 300).sample().unwrap_err();
        assert!(matches!(err, CrawlError::InvalidDelay { .. }));
    }

    #[test]
    fn test_zero_deviation_is_exact() {
        assert_eq!(
            Jitter::millis(1000, 0).sample().expect("valid jitter"),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(CrawlError::Cancelled.is_fatal());
        assert!(CrawlError::Cancelled.is_cancelled());
        assert!(!CrawlError::Timeout(Duration::from_secs(1)).is_fatal());
        assert!(
            !CrawlError::HttpStatus {
                status: 404,
                url: "u".into()
            }
            .is_fatal()
        );
    }
}
