//! Type-safe builder for `CrawlerConfig` using the typestate pattern
//!
//! The database path is the only required value; `build()` only exists once
//! it has been provided.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{CrawlerConfig, FailurePolicy};
use crate::crawl_engine::CrawlError;

// Type states for the builder
pub struct WithDbPath;

pub struct CrawlerConfigBuilder<State = ()> {
    inner: CrawlerConfig,
    db_path: Option<PathBuf>,
    _phantom: PhantomData<State>,
}

impl CrawlerConfigBuilder<()> {
    pub(crate) fn new() -> Self {
        Self {
            inner: CrawlerConfig::default(),
            db_path: None,
            _phantom: PhantomData,
        }
    }

    /// Set the SQLite database file
    #[must_use]
    pub fn db_path(self, path: impl Into<PathBuf>) -> CrawlerConfigBuilder<WithDbPath> {
        CrawlerConfigBuilder {
            inner: self.inner,
            db_path: Some(path.into()),
            _phantom: PhantomData,
        }
    }
}

impl CrawlerConfigBuilder<WithDbPath> {
    /// Validate and freeze the configuration
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Config` when a value is out of range.
    pub fn build(self) -> Result<CrawlerConfig, CrawlError> {
        let mut config = self.inner;
        config.db_path = self
            .db_path
            .ok_or_else(|| CrawlError::Config("db_path is required".to_string()))?;

        if config.retries == 0 {
            return Err(CrawlError::Config(
                "retries must allow at least one attempt".to_string(),
            ));
        }

        if config.max_pages == 0 {
            return Err(CrawlError::Config("max_pages must be at least 1".to_string()));
        }

        url::Url::parse(&config.site_prefix).map_err(|e| {
            CrawlError::Config(format!("invalid site prefix '{}': {e}", config.site_prefix))
        })?;

        if let Some(proxy) = &config.proxy_url
            && proxy.trim().is_empty()
        {
            config.proxy_url = None;
        }

        if let Some(addr) = &config.browser_addr
            && addr.trim().is_empty()
        {
            config.browser_addr = None;
        }

        if config.navigation_timeout.is_zero() {
            return Err(CrawlError::Config(
                "navigation_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

// Optional settings, available in any state
impl<State> CrawlerConfigBuilder<State> {
    #[must_use]
    pub fn site_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.inner.site_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn proxy_url(mut self, proxy: Option<String>) -> Self {
        self.inner.proxy_url = proxy;
        self
    }

    #[must_use]
    pub fn browser_addr(mut self, addr: Option<String>) -> Self {
        self.inner.browser_addr = addr;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.inner.headless = headless;
        self
    }

    #[must_use]
    pub fn user_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.inner.user_data_dir = dir;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.inner.max_pages = pages;
        self
    }

    /// Attempts per page transition (not additional retries)
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.inner.retries = retries;
        self
    }

    #[must_use]
    pub fn rate_limit_interval(mut self, navigations: u32) -> Self {
        self.inner.rate_limit_interval = navigations;
        self
    }

    #[must_use]
    pub fn rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.inner.rate_limit_cooldown = cooldown;
        self
    }

    /// Backoff after the n-th transient failure is `base + step * n`
    #[must_use]
    pub fn retry_backoff(mut self, base: Duration, step: Duration) -> Self {
        self.inner.retry_base_cooldown = base;
        self.inner.retry_step = step;
        self
    }

    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.inner.navigation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.inner.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn screenshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.inner.screenshot_dir = dir;
        self
    }
}
