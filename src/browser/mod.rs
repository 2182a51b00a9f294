//! Browser automation seam
//!
//! The crawl engine never talks to chromiumoxide directly. It drives a
//! [`BrowserSession`] that hands out isolated [`BrowserTab`]s, so the
//! navigation, retry and tab management logic can be exercised against an
//! in-memory browser in tests.

pub mod chromium;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub use chromium::{ChromiumSession, ChromiumTab};

/// Helper script injected into every tab before the first document loads.
///
/// Exposes `window.__cinecrawl.exists(selector)` and
/// `window.__cinecrawl.visible(selector)`.
pub const DOM_HELPERS_SCRIPT: &str = include_str!("scripts/dom_helpers.js");

/// Errors raised by the browser automation layer
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Tab already closed")]
    Closed,
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Response to the primary request of a page transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationResponse {
    /// HTTP status of the document response, if the transition produced one
    pub status: Option<u16>,
}

impl NavigationResponse {
    #[must_use]
    pub const fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
        }
    }
}

/// Network traffic observed on a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Request {
        url: String,
        method: String,
    },
    Response {
        url: String,
        status: u16,
        mime_type: String,
    },
}

/// A single isolated browser execution context
#[async_trait]
pub trait BrowserTab: Send + Sync {
    /// Navigate to `url` and wait for the document response.
    async fn navigate(&self, url: &str) -> BrowserResult<NavigationResponse>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> BrowserResult<()>;

    /// Click the first element matching `selector` and wait for the
    /// navigation it causes, if any.
    async fn click_and_wait(&self, selector: &str) -> BrowserResult<NavigationResponse>;

    /// Resolve once an element matching `selector` is rendered and visible.
    ///
    /// Never times out on its own; callers bound it with a deadline or a
    /// cancellation token.
    async fn wait_visible(&self, selector: &str) -> BrowserResult<()>;

    /// Evaluate a script in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> BrowserResult<serde_json::Value>;

    /// Outer HTML of the first element matching `selector`.
    async fn outer_html(&self, selector: &str) -> BrowserResult<String>;

    /// Rendered text of the first element matching `selector`.
    async fn text(&self, selector: &str) -> BrowserResult<String>;

    /// Register a script that runs before every document in this tab.
    async fn inject_script_on_new_document(&self, script: &str) -> BrowserResult<()>;

    /// Full page screenshot encoded as PNG.
    async fn screenshot(&self) -> BrowserResult<Vec<u8>>;

    /// Stream of requests and responses issued by this tab.
    async fn network_events(&self) -> BrowserResult<BoxStream<'static, NetworkEvent>>;

    /// Close the tab and free its browser resources.
    async fn close(&self) -> BrowserResult<()>;
}

/// Allocator of isolated tabs on a running browser
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Tab: BrowserTab + 'static;

    /// Open a fresh tab on `about:blank`.
    async fn new_tab(&self) -> BrowserResult<Self::Tab>;

    /// Close the browser. Tabs still open become unusable.
    async fn shutdown(&self) -> BrowserResult<()>;
}

/// Check whether `selector` matches an element, via the injected helpers.
pub async fn element_exists<T: BrowserTab + ?Sized>(tab: &T, selector: &str) -> BrowserResult<bool> {
    let literal = serde_json::to_string(selector)
        .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
    let script = format!(
        "(window.__cinecrawl ? window.__cinecrawl.exists({literal}) : document.querySelector({literal}) !== null)"
    );
    let value = tab.evaluate(&script).await?;
    Ok(value.as_bool().unwrap_or(false))
}
