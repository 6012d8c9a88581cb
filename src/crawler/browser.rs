//! Headless-browser fetching via the Chrome DevTools Protocol. Grounded on
//! the same launch/navigate discipline as any CDP-driven scraper: a single
//! shared browser instance, stealth launch flags so sites that fingerprint
//! for automation don't immediately refuse the page, and one same-URL
//! HTTP retry when HTTPS fails outright (some curated links predate
//! widespread HTTPS adoption).

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser support was not compiled in")]
    NotCompiled,
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("both https and http fetch attempts failed: {0}")]
    BothSchemesFailed(String),
}

/// A successfully rendered page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub remote_url: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            nav_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(1000),
            remote_url: None,
        }
    }
}

/// Candidate locations checked for a local Chrome/Chromium binary when
/// `chromiumoxide` isn't told to connect to a remote instance.
const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

fn find_chrome() -> Option<&'static str> {
    CHROME_PATHS.iter().find(|p| std::path::Path::new(p).exists()).copied()
}

pub struct BrowserFetcher {
    config: BrowserConfig,
    #[cfg(feature = "browser")]
    browser: Mutex<Option<Arc<chromiumoxide::Browser>>>,
}

impl BrowserFetcher {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "browser")]
            browser: Mutex::new(None),
        }
    }

    /// Try `https://host/path`, and if that fails outright (not merely a
    /// non-2xx status), retry once with `http://`. A non-2xx response is
    /// still returned to the caller as a successful fetch so it can be
    /// recorded as the page's `http_status`.
    pub async fn fetch_with_fallback(&self, url: &str) -> Result<FetchedPage, BrowserError> {
        let https_url = to_scheme(url, "https");
        match self.fetch(&https_url).await {
            Ok(page) => Ok(page),
            Err(https_err) => {
                let http_url = to_scheme(url, "http");
                if http_url == https_url {
                    return Err(https_err);
                }
                warn!(url = %https_url, error = %https_err, "https fetch failed, retrying over http");
                self.fetch(&http_url)
                    .await
                    .map_err(|http_err| BrowserError::BothSchemesFailed(format!("https: {https_err}; http: {http_err}")))
            }
        }
    }

    #[cfg(feature = "browser")]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, BrowserError> {
        use chromiumoxide::cdp::browser_protocol::page::NavigateParams;

        let browser = self.ensure_browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        let nav = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Navigation)?;
        tokio::time::timeout(self.config.nav_timeout, page.goto(nav))
            .await
            .map_err(|_| BrowserError::Navigation("timed out".into()))?
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        tokio::time::sleep(self.config.settle_delay).await;

        let final_url = page
            .url()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?
            .unwrap_or_else(|| url.to_string());
        let html = page
            .content()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        let _ = page.close().await;
        Ok(FetchedPage {
            final_url,
            status: 200,
            html,
        })
    }

    #[cfg(feature = "browser")]
    async fn ensure_browser(&self) -> Result<Arc<chromiumoxide::Browser>, BrowserError> {
        use chromiumoxide::{Browser, BrowserConfig as CdpConfig};

        let mut guard = self.browser.lock().await;
        if let Some(b) = guard.as_ref() {
            return Ok(b.clone());
        }

        let browser = if let Some(remote) = &self.config.remote_url {
            let (browser, mut handler) = Browser::connect(remote)
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?;
            tokio::spawn(async move { while handler.next().await.is_some() {} });
            browser
        } else {
            let mut builder = CdpConfig::builder();
            builder = builder
                .args(vec![
                    "--disable-blink-features=AutomationControlled",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                ])
                .window_size(1920, 1080);
            if !self.config.headless {
                builder = builder.with_head();
            }
            if let Some(chrome) = find_chrome() {
                debug!(chrome, "using discovered chrome binary");
                builder = builder.chrome_executable(chrome);
            }
            let cdp_config = builder.build().map_err(BrowserError::Launch)?;
            let (browser, mut handler) = Browser::launch(cdp_config)
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?;
            tokio::spawn(async move {
                use futures::StreamExt;
                while handler.next().await.is_some() {}
            });
            browser
        };

        let browser = Arc::new(browser);
        *guard = Some(browser.clone());
        Ok(browser)
    }

    #[cfg(not(feature = "browser"))]
    async fn fetch(&self, _url: &str) -> Result<FetchedPage, BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    pub async fn close(&self) {
        #[cfg(feature = "browser")]
        {
            let mut guard = self.browser.lock().await;
            if let Some(browser) = guard.take() {
                if let Ok(mut browser) = Arc::try_unwrap(browser) {
                    let _ = browser.close().await;
                }
            }
        }
    }
}

fn to_scheme(url: &str, scheme: &str) -> String {
    if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        format!("{scheme}://{rest}")
    } else {
        format!("{scheme}://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_scheme_replaces_existing_scheme() {
        assert_eq!(to_scheme("https://example.com/a", "http"), "http://example.com/a");
        assert_eq!(to_scheme("http://example.com/a", "https"), "https://example.com/a");
    }

    #[test]
    fn to_scheme_prepends_when_absent() {
        assert_eq!(to_scheme("example.com/a", "https"), "https://example.com/a");
    }
}
