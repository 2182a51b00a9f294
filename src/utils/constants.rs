//! Shared constants for the crawler
//!
//! Site layout constants and browser defaults live here so the extractors,
//! orchestrator and browser setup agree on them.

/// Root of the crawled site; every relative href is resolved against it.
pub const SITE_PREFIX: &str = "https://letterboxd.com";

/// Popular members listing, paginated from 1.
pub const MEMBERS_PAGE_PATH: &str = "/members/popular/page";

/// Chrome user agent string for locally launched browsers
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Polling period used while waiting for an element to become visible.
pub const VISIBILITY_POLL_MS: u64 = 100;

/// Default log file when running silent.
pub const DEFAULT_LOG_FILE: &str = "/tmp/cinecrawl.log";
