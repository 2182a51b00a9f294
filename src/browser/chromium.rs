//! chromiumoxide implementation of the browser seam
//!
//! Finds or downloads a Chromium binary, launches it (or attaches to a
//! remote DevTools endpoint), drives the CDP handler on a tracked task and
//! exposes each `Page` as a [`BrowserTab`].

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::network::{EventRequestWillBeSent, EventResponseReceived};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
    NavigateParams,
};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::Handler;
use chromiumoxide::Page;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

use super::{BrowserError, BrowserResult, BrowserSession, BrowserTab, NavigationResponse, NetworkEvent};
use crate::config::CrawlerConfig;
use crate::utils::constants::{CHROME_USER_AGENT, VISIBILITY_POLL_MS};

/// Find Chrome/Chromium executable on the system with platform-specific search paths.
pub async fn find_browser_executable() -> Result<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if let Some(rest) = path_str.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let output = Command::new("which").arg(cmd).output();

            if let Ok(output) = output
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("Found browser using 'which' command: {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found. Will download and use fetcher.");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Downloads a managed Chromium into the user cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cinecrawl")
        .join("chromium");

    std::fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Drive the CDP connection until the browser goes away.
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // chromiumoxide cannot decode every CDP event Chrome emits
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!("Suppressed benign CDP serialization error: {}", error_msg);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    })
}

/// A running Chromium, launched locally or attached remotely
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch or connect according to `config`.
    pub async fn start(config: &CrawlerConfig) -> Result<Self> {
        match config.browser_addr() {
            Some(addr) => Self::connect(addr).await,
            None => Self::launch(config).await,
        }
    }

    /// Attach to a browser exposing a DevTools endpoint (ws:// or http://).
    pub async fn connect(addr: &str) -> Result<Self> {
        info!(browser_addr = addr, "Connecting to remote browser");
        let (browser, handler) = Browser::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to browser at {addr}"))?;

        Ok(Self {
            browser: Mutex::new(browser),
            handler: spawn_handler(handler),
        })
    }

    /// Launch a local browser honouring headless, proxy and profile settings.
    pub async fn launch(config: &CrawlerConfig) -> Result<Self> {
        let chrome_path = match find_browser_executable().await {
            Ok(path) => path,
            Err(_) => download_managed_browser().await?,
        };

        let user_data_dir = config.user_data_dir().cloned().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("cinecrawl_chrome_{}", std::process::id()))
        });
        std::fs::create_dir_all(&user_data_dir).context("Failed to create user data directory")?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(60))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir)
            .chrome_executable(chrome_path);

        builder = if config.headless() {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        if let Some(proxy) = config.proxy_url() {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }

        builder = builder
            .arg(format!("--user-agent={CHROME_USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-backgrounding-occluded-windows")
            .arg("--disable-renderer-backgrounding")
            .arg("--disable-gpu")
            .arg("--mute-audio");

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        info!(
            headless = config.headless(),
            proxy = config.proxy_url().unwrap_or(""),
            "Launching browser"
        );
        let (browser, handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        Ok(Self {
            browser: Mutex::new(browser),
            handler: spawn_handler(handler),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    type Tab = ChromiumTab;

    async fn new_tab(&self) -> BrowserResult<ChromiumTab> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(ChromiumTab { page })
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser cleanly: {e}");
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to wait for browser process: {e}");
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// One chromiumoxide page
pub struct ChromiumTab {
    page: Page,
}

impl ChromiumTab {
    fn protocol(e: impl std::fmt::Display) -> BrowserError {
        BrowserError::Protocol(e.to_string())
    }

    async fn wait_response(&self, url: &str) -> BrowserResult<NavigationResponse> {
        let request = self
            .page
            .wait_for_navigation_response()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = request
            .as_ref()
            .and_then(|req| req.response.as_ref())
            .and_then(|resp| u16::try_from(resp.status).ok());

        Ok(NavigationResponse { status })
    }
}

#[async_trait]
impl BrowserTab for ChromiumTab {
    async fn navigate(&self, url: &str) -> BrowserResult<NavigationResponse> {
        self.page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.wait_response(url).await
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(Self::protocol)?;
        Ok(())
    }

    async fn click_and_wait(&self, selector: &str) -> BrowserResult<NavigationResponse> {
        self.click(selector).await?;
        self.wait_response(selector).await
    }

    async fn wait_visible(&self, selector: &str) -> BrowserResult<()> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        let script = format!(
            "(window.__cinecrawl ? window.__cinecrawl.visible({literal}) : document.querySelector({literal}) !== null)"
        );
        let poll_interval = Duration::from_millis(VISIBILITY_POLL_MS);

        loop {
            match self.evaluate(&script).await {
                Ok(value) if value.as_bool() == Some(true) => return Ok(()),
                Ok(_) => {}
                Err(e) => trace!("Visibility probe for {selector} failed: {e}"),
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn evaluate(&self, script: &str) -> BrowserResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn outer_html(&self, selector: &str) -> BrowserResult<String> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element
            .outer_html()
            .await
            .map_err(Self::protocol)?
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }

    async fn text(&self, selector: &str) -> BrowserResult<String> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        Ok(element
            .inner_text()
            .await
            .map_err(Self::protocol)?
            .unwrap_or_default())
    }

    async fn inject_script_on_new_document(&self, script: &str) -> BrowserResult<()> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams {
                source: script.to_string(),
                include_command_line_api: None,
                world_name: None,
                run_immediately: None,
            })
            .await
            .map_err(Self::protocol)?;
        Ok(())
    }

    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.page
            .screenshot(CaptureScreenshotParams {
                format: Some(CaptureScreenshotFormat::Png),
                capture_beyond_viewport: Some(true),
                ..Default::default()
            })
            .await
            .map_err(Self::protocol)
    }

    async fn network_events(&self) -> BrowserResult<BoxStream<'static, NetworkEvent>> {
        let requests = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(Self::protocol)?
            .map(|ev| NetworkEvent::Request {
                url: ev.request.url.clone(),
                method: ev.request.method.clone(),
            });

        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(Self::protocol)?
            .map(|ev| NetworkEvent::Response {
                url: ev.response.url.clone(),
                status: u16::try_from(ev.response.status).unwrap_or_default(),
                mime_type: ev.response.mime_type.clone(),
            });

        Ok(futures::stream::select(requests, responses).boxed())
    }

    async fn close(&self) -> BrowserResult<()> {
        self.page.clone().close().await.map_err(Self::protocol)
    }
}
