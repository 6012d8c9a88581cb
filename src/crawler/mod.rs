//! Crawling: fetch a URL with a headless browser, extract title/description/
//! content from the rendered HTML, and hand the result to the store.

pub mod browser;
pub mod extract;
pub mod links;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::store::{CrawlUpdate, Store, StoreError};

use browser::{BrowserError, BrowserFetcher};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
}

/// Outcome of crawling a single URL, enough to report per-item progress to
/// a job runner without holding onto the full page content.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub url: String,
    pub success: bool,
    pub http_status: Option<i64>,
    pub error: Option<String>,
    pub content_changed: bool,
}

pub struct Crawler {
    store: Arc<Store>,
    fetcher: BrowserFetcher,
}

impl Crawler {
    pub fn new(store: Arc<Store>, fetcher: BrowserFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Fetch, extract, and persist a single URL. Never returns `Err` for a
    /// failed fetch — that's recorded as a non-`success` `CrawlOutcome` so a
    /// batch crawl can keep going past individual failures; `Err` is
    /// reserved for store errors the caller can't route around.
    pub async fn crawl_one(&self, url: &str) -> Result<CrawlOutcome, CrawlError> {
        info!(url, "crawling");
        let fetch = self.fetcher.fetch_with_fallback(url).await;
        let (update, success) = match fetch {
            Ok(page) => {
                let extracted = extract::extract(&page.html, &page.final_url);
                (
                    CrawlUpdate {
                        title: extracted.title,
                        description: extracted.description,
                        content: Some(extracted.content),
                        http_status: Some(page.status as i64),
                        crawl_error: None,
                    },
                    true,
                )
            }
            Err(e) => {
                warn!(url, error = %e, "crawl failed");
                (
                    CrawlUpdate {
                        title: None,
                        description: None,
                        content: None,
                        http_status: None,
                        crawl_error: Some(e.to_string()),
                    },
                    false,
                )
            }
        };
        let http_status = update.http_status;
        let error = update.crawl_error.clone();
        let (_, content_changed) = self.store.crawl_update(url, &update)?;
        Ok(CrawlOutcome {
            url: url.to_string(),
            success,
            http_status,
            error,
            content_changed,
        })
    }
}
