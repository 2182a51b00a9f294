//! Navigation rate limiter
//!
//! Counts navigations issued through the executor and inserts a fixed
//! cooldown every `interval` navigations. Lock-free counter, async sleep.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use log::info;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlResult};
use crate::config::CrawlerConfig;

/// Allow `interval` navigations, then pause for `cooldown`
#[derive(Debug)]
pub struct NavigationRateLimiter {
    interval: u32,
    cooldown: Duration,
    counter: AtomicU32,
}

impl NavigationRateLimiter {
    /// `interval == 0` disables limiting.
    #[must_use]
    pub fn new(interval: u32, cooldown: Duration) -> Self {
        Self {
            interval,
            cooldown,
            counter: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.rate_limit_interval(), config.rate_limit_cooldown())
    }

    /// Navigations counted since the last cooldown
    #[inline]
    #[must_use]
    pub fn count(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }

    /// Wait for permission to navigate once.
    ///
    /// # Errors
    ///
    /// `CrawlError::Cancelled` if `cancel` fires during a cooldown. The
    /// counter is left untouched in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> CrawlResult<()> {
        if self.interval == 0 {
            return Ok(());
        }

        if self.counter.load(Ordering::Acquire) >= self.interval {
            info!(
                "Reached {} navigations, cooling down for {:?}",
                self.interval, self.cooldown
            );
            tokio::select! {
                () = cancel.cancelled() => return Err(CrawlError::Cancelled),
                () = tokio::time::sleep(self.cooldown) => {}
            }
            self.counter.store(0, Ordering::Release);
        }

        self.counter.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
