//! Tab manager
//!
//! Every movie, activity and review page is scraped in its own tab so a
//! broken page never leaks state into the next unit of work. Tabs come with
//! the DOM helper script pre-registered and a background task that logs the
//! tab's network traffic at debug level.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::crawl_types::CrawlResult;
use crate::browser::{BrowserSession, BrowserTab, DOM_HELPERS_SCRIPT, NetworkEvent};

/// Hands out prepared tabs on a shared browser session
pub struct TabManager<S: BrowserSession> {
    session: Arc<S>,
}

impl<S: BrowserSession> Clone for TabManager<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: BrowserSession> TabManager<S> {
    #[must_use]
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Open a new isolated tab labelled `purpose` (used in logs only).
    ///
    /// # Errors
    ///
    /// Browser errors from creating the tab, registering the helper script
    /// or subscribing to network events. A half-prepared tab is closed.
    pub async fn open(&self, purpose: &str) -> CrawlResult<TabGuard<S::Tab>> {
        let tab = Arc::new(self.session.new_tab().await?);

        let prepared = async {
            tab.inject_script_on_new_document(DOM_HELPERS_SCRIPT).await?;
            tab.network_events().await
        }
        .await;

        let events = match prepared {
            Ok(events) => events,
            Err(e) => {
                if let Err(close_err) = tab.close().await {
                    warn!(purpose, error = %close_err, "Failed to close tab after setup error");
                }
                return Err(e.into());
            }
        };

        let label = purpose.to_string();
        let logger = tokio::spawn(async move {
            let mut events = events;
            while let Some(event) = events.next().await {
                match event {
                    NetworkEvent::Request { url, method } => {
                        debug!(tab = %label, %url, %method, "request");
                    }
                    NetworkEvent::Response {
                        url,
                        status,
                        mime_type,
                    } => {
                        debug!(tab = %label, %url, status, mime_type = %mime_type, "response");
                    }
                }
            }
        });

        debug!(purpose, "Opened tab");
        Ok(TabGuard {
            tab: Some(tab),
            logger: Some(logger),
            purpose: purpose.to_string(),
        })
    }
}

/// RAII handle over an open tab
///
/// Call [`TabGuard::release`] to close the tab deterministically. A guard
/// dropped without release (early return, panic) stops the network logger
/// and closes the tab from a spawned task.
pub struct TabGuard<T: BrowserTab + 'static> {
    tab: Option<Arc<T>>,
    logger: Option<JoinHandle<()>>,
    purpose: String,
}

impl<T: BrowserTab + 'static> TabGuard<T> {
    /// Shared handle to the tab, for the navigation controller.
    ///
    /// # Panics
    ///
    /// Never: the tab is only taken by `release` and `drop`, both of which
    /// consume the guard.
    #[must_use]
    pub fn tab(&self) -> &Arc<T> {
        self.tab
            .as_ref()
            .expect("BUG: tab accessed after release")
    }

    #[must_use]
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Close the tab and stop its network logger.
    pub async fn release(mut self) {
        if let Some(logger) = self.logger.take() {
            logger.abort();
        }
        if let Some(tab) = self.tab.take() {
            match tab.close().await {
                Ok(()) => debug!(purpose = %self.purpose, "Closed tab"),
                Err(e) => warn!(purpose = %self.purpose, error = %e, "Failed to close tab"),
            }
        }
    }
}

impl<T: BrowserTab + 'static> Drop for TabGuard<T> {
    fn drop(&mut self) {
        if let Some(logger) = self.logger.take() {
            logger.abort();
        }
        if let Some(tab) = self.tab.take() {
            let purpose = std::mem::take(&mut self.purpose);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = tab.close().await {
                            warn!(%purpose, error = %e, "Failed to close dropped tab");
                        }
                    });
                }
                Err(_) => warn!(%purpose, "No runtime available to close dropped tab"),
            }
        }
    }
}
