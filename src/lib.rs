pub mod browser;
pub mod config;
pub mod crawl_engine;
pub mod extractors;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;

pub use browser::{BrowserError, BrowserSession, BrowserTab, ChromiumSession, NavigationResponse};
pub use config::{CrawlerConfig, FailurePolicy};
pub use crawl_engine::{
    CrawlError, CrawlResult, CrawlSummary, Crawler, FailedUnit, Jitter, Navigator, PageExecutor,
    TabManager, Transition, Trigger, UnitKind,
};
pub use extractors::{ExtractError, ExtractResult};
pub use store::{Store, StoreError, UpsertMode, UpsertOutcome};

/// Crawl the site with a locally launched (or remote) Chromium.
///
/// The browser is shut down and the store closed whether or not the crawl
/// succeeds, including when the browser never starts.
///
/// # Errors
///
/// Browser startup failures, store failures, and whatever the crawl returns
/// under the configured failure policy.
pub async fn crawl(
    config: CrawlerConfig,
    cancel: tokio_util::sync::CancellationToken,
) -> anyhow::Result<CrawlSummary> {
    let store = Store::open(config.db_path()).await?;
    let result = crawl_with_store(config, store.clone(), cancel).await;
    store.close().await;
    result
}

async fn crawl_with_store(
    config: CrawlerConfig,
    store: Store,
    cancel: tokio_util::sync::CancellationToken,
) -> anyhow::Result<CrawlSummary> {
    let session = std::sync::Arc::new(ChromiumSession::start(&config).await?);

    let result = Crawler::new(config, store, std::sync::Arc::clone(&session), cancel)
        .run()
        .await;

    if let Err(e) = session.shutdown().await {
        tracing::warn!(error = %e, "Browser shutdown failed");
    }

    Ok(result?)
}
