//! cinecrawl command line entry point
//!
//! Every flag falls back to an environment variable, and a `.env` file in
//! the working directory is loaded first.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cinecrawl::logging::{self, LogFormat, LoggingOptions};
use cinecrawl::{CrawlerConfig, FailurePolicy};

#[derive(Parser, Debug)]
#[command(name = "cinecrawl")]
#[command(about = "Crawl popular members, their films and activity into SQLite")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "DB_PATH", default_value = "./cinecrawl.sqlite")]
    db_path: PathBuf,

    /// Proxy for the locally launched browser
    #[arg(long, env = "PROXY_URL")]
    proxy_url: Option<String>,

    /// DevTools endpoint of a running browser; skips the local launch
    #[arg(long, env = "BROWSER_ADDR")]
    browser_addr: Option<String>,

    #[arg(long, env = "HEADLESS", default_value_t = true, action = clap::ArgAction::Set)]
    headless: bool,

    /// Persistent browser profile directory
    #[arg(long, env = "USER_DATA_DIR")]
    user_data_dir: Option<PathBuf>,

    /// Number of popular members pages to crawl
    #[arg(long, env = "MAX_PAGE", default_value_t = 1)]
    max_page: u32,

    /// Attempts per page transition
    #[arg(long, env = "RETRIES", default_value_t = 3)]
    retries: u32,

    /// Navigations between two rate-limit cooldowns (0 disables)
    #[arg(long, env = "INTERVAL", default_value_t = 50)]
    interval: u32,

    /// Rate-limit cooldown in seconds
    #[arg(long, env = "COOLDOWN_SECS", default_value_t = 300)]
    cooldown_secs: u64,

    /// Navigation deadline in seconds, triggers included
    #[arg(long, env = "NAVIGATION_TIMEOUT_SECS", default_value_t = 120)]
    navigation_timeout_secs: u64,

    #[arg(long, env = "DEBUG", default_value_t = false, action = clap::ArgAction::Set)]
    debug: bool,

    /// Log to a file instead of stdout
    #[arg(long, env = "SILENT", default_value_t = false, action = clap::ArgAction::Set)]
    silent: bool,

    #[arg(long, env = "LOG_FILE_PATH")]
    log_file_path: Option<PathBuf>,

    /// json or text
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    /// Save a screenshot of every failed page here
    #[arg(long, env = "SCREENSHOT_DIR")]
    screenshot_dir: Option<PathBuf>,

    /// Record failed users and movies and keep going instead of aborting
    #[arg(long, env = "SKIP_FAILED_UNITS", default_value_t = false, action = clap::ArgAction::Set)]
    skip_failed_units: bool,
}

impl Cli {
    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            debug: self.debug,
            silent: self.silent,
            log_file: self.log_file_path.clone(),
            format: self.log_format,
        }
    }

    fn crawler_config(self) -> Result<CrawlerConfig> {
        let policy = if self.skip_failed_units {
            FailurePolicy::SkipUnit
        } else {
            FailurePolicy::AbortRun
        };

        Ok(CrawlerConfig::builder()
            .db_path(self.db_path)
            .proxy_url(self.proxy_url)
            .browser_addr(self.browser_addr)
            .headless(self.headless)
            .user_data_dir(self.user_data_dir)
            .max_pages(self.max_page)
            .retries(self.retries)
            .rate_limit_interval(self.interval)
            .rate_limit_cooldown(Duration::from_secs(self.cooldown_secs))
            .navigation_timeout(Duration::from_secs(self.navigation_timeout_secs))
            .failure_policy(policy)
            .screenshot_dir(self.screenshot_dir)
            .build()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real env vars and flags still apply.
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.logging_options())?;
    let config = cli.crawler_config()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping crawl");
            on_signal.cancel();
        }
    });

    let summary = cinecrawl::crawl(config, cancel).await?;

    info!(
        members_pages = summary.members_pages,
        users = summary.users,
        movies_scraped = summary.movies_scraped,
        movies_skipped = summary.movies_skipped,
        activities = summary.activities,
        failed = summary.failed.len(),
        "Crawl complete"
    );
    for failed in &summary.failed {
        warn!(kind = %failed.kind, url = %failed.url, error = %failed.error, "Unit failed");
    }

    Ok(())
}
