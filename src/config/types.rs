//! Core configuration types for the crawler
//!
//! `CrawlerConfig` is built once at startup and handed by reference to every
//! component. Nothing below the binary reads process environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What the orchestrator does when one user or movie fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any fatal error halts the whole run
    #[default]
    AbortRun,
    /// Record the failed unit in the run summary and carry on with the next one
    SkipUnit,
}

/// Immutable crawler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// SQLite database file; created and provisioned on first run.
    pub(crate) db_path: PathBuf,

    /// Site root every relative href is resolved against.
    pub(crate) site_prefix: String,

    /// Static proxy passed to a locally launched browser.
    pub(crate) proxy_url: Option<String>,

    /// DevTools endpoint of an already running browser. When set, no local
    /// browser is launched and `headless`/`proxy_url`/`user_data_dir` are ignored.
    pub(crate) browser_addr: Option<String>,

    pub(crate) headless: bool,

    /// Persistent browser profile (cookies survive restarts).
    pub(crate) user_data_dir: Option<PathBuf>,

    /// Number of popular-members pages to walk.
    pub(crate) max_pages: u32,

    /// Attempts per page transition before giving up.
    pub(crate) retries: u32,

    /// Navigations allowed between two cooldowns. 0 disables the limiter.
    pub(crate) rate_limit_interval: u32,

    /// Pause inserted after every `rate_limit_interval` navigations.
    ///
    /// Default: 300 seconds
    pub(crate) rate_limit_cooldown: Duration,

    /// Fixed part of the backoff after a transient server error.
    ///
    /// Default: 30 seconds
    pub(crate) retry_base_cooldown: Duration,

    /// Added to the backoff once per attempt already made.
    ///
    /// Default: 10 seconds
    pub(crate) retry_step: Duration,

    /// Deadline for one navigation including its triggers.
    ///
    /// Default: 120 seconds
    pub(crate) navigation_timeout: Duration,

    pub(crate) failure_policy: FailurePolicy,

    /// Where failure screenshots are written. Disabled when unset.
    pub(crate) screenshot_dir: Option<PathBuf>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./cinecrawl.sqlite"),
            site_prefix: crate::utils::SITE_PREFIX.to_string(),
            proxy_url: None,
            browser_addr: None,
            headless: true,
            user_data_dir: None,
            max_pages: 1,
            retries: 3,
            rate_limit_interval: 50,
            rate_limit_cooldown: Duration::from_secs(300),
            retry_base_cooldown: Duration::from_secs(30),
            retry_step: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(120),
            failure_policy: FailurePolicy::AbortRun,
            screenshot_dir: None,
        }
    }
}

impl CrawlerConfig {
    /// Start a builder; `db_path` must be set before `build()` is available.
    #[must_use]
    pub fn builder() -> super::builder::CrawlerConfigBuilder<()> {
        super::builder::CrawlerConfigBuilder::new()
    }
}
