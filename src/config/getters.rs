//! Getter methods for `CrawlerConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{CrawlerConfig, FailurePolicy};

impl CrawlerConfig {
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    #[must_use]
    pub fn site_prefix(&self) -> &str {
        &self.site_prefix
    }

    #[must_use]
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    #[must_use]
    pub fn browser_addr(&self) -> Option<&str> {
        self.browser_addr.as_deref()
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn user_data_dir(&self) -> Option<&PathBuf> {
        self.user_data_dir.as_ref()
    }

    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub fn rate_limit_interval(&self) -> u32 {
        self.rate_limit_interval
    }

    #[must_use]
    pub fn rate_limit_cooldown(&self) -> Duration {
        self.rate_limit_cooldown
    }

    #[must_use]
    pub fn retry_base_cooldown(&self) -> Duration {
        self.retry_base_cooldown
    }

    #[must_use]
    pub fn retry_step(&self) -> Duration {
        self.retry_step
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    #[must_use]
    pub fn screenshot_dir(&self) -> Option<&Path> {
        self.screenshot_dir.as_deref()
    }
}
