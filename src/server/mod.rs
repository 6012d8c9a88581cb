//! JSON HTTP API. A thin `axum` façade over the store/search/crawler/jobs
//! core — every business rule lives there, not in a handler.

mod dto;
mod handlers;
mod routes;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Settings;
use crate::crawler::Crawler;
use crate::embedder::Embedder;
use crate::jobs::JobRunner;
use crate::search::SearchEngine;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub search: Arc<SearchEngine>,
    pub crawler: Arc<Crawler>,
    pub embedder: Arc<dyn Embedder>,
    pub jobs: Arc<JobRunner>,
    /// `rusqlite::Connection` is `!Sync`; batch/job code that issues several
    /// statements in a row from spawned tasks serializes through this
    /// rather than relying on `Store`'s internal per-call locking alone.
    pub write_lock: Arc<Mutex<()>>,
}

pub async fn serve(settings: Settings, state: AppState) -> anyhow::Result<()> {
    let router = routes::create_router(state, settings.debug);
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::browser::{BrowserConfig, BrowserFetcher};
    use crate::embedder::FakeEmbedder;

    pub fn test_state() -> AppState {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);
        let search = Arc::new(SearchEngine::new(store.clone(), embedder.clone(), 3600).unwrap());
        let crawler = Arc::new(Crawler::new(store.clone(), BrowserFetcher::new(BrowserConfig::default())));
        AppState {
            store,
            search,
            crawler,
            embedder,
            jobs: Arc::new(JobRunner::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[tokio::test]
    async fn router_builds_without_panicking() {
        let _router = routes::create_router(test_state(), false);
    }
}
