//! Crawl Engine Module
//!
//! Navigation control, retries, rate limiting and tab management, plus the
//! orchestrator that walks the site with them.

// Sub-modules
pub mod crawl_types;
pub mod executor;
pub mod navigation;
pub mod orchestrator;
pub mod rate_limiter;
pub mod retry;
pub mod screenshot;
pub mod tabs;

// Re-exports for public API
pub use crawl_types::{
    CrawlError, CrawlResult, CrawlSummary, FailedUnit, Jitter, Transition, Trigger, UnitKind,
};
pub use executor::PageExecutor;
pub use navigation::Navigator;
pub use orchestrator::Crawler;
pub use rate_limiter::NavigationRateLimiter;
pub use retry::{RetryPolicy, StatusClass, classify_status};
pub use screenshot::{capture_failure, screenshot_file_name};
pub use tabs::{TabGuard, TabManager};
