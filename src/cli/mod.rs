//! Command-line entry point. A thin dispatcher over the core, mirroring the
//! abstract command surface one-to-one: argument parsing and error
//! rendering live here, everything else lives in `store`/`search`/`crawler`.

mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{ConfigArgs, Settings};
use crate::crawler::browser::{BrowserConfig, BrowserFetcher};
use crate::crawler::Crawler;
use crate::embedder::{Embedder, FakeEmbedder, HttpEmbedder};
use crate::jobs::JobRunner;
use crate::search::SearchEngine;
use crate::server::{self, AppState};
use crate::store::Store;

#[derive(Parser)]
#[command(name = "curio", about = "A personal search engine for curated web links")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a URL to the collection.
    Add { url: String },
    /// List stored links.
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        show_hidden: bool,
    },
    /// Remove a link by id, URL, or glob pattern.
    Remove {
        target: String,
        #[arg(long)]
        glob: bool,
    },
    /// Refresh a link's `updated_at` without re-crawling it.
    UpdateTimestamp { url: String },
    /// Deduplicate stored links by exact URL (legacy import cleanup).
    CleanDuplicates,
    /// Hybrid search (lexical + dense, fused by RRF). The default mode.
    Search {
        query: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0.5)]
        kw_weight: f64,
        #[arg(long, default_value_t = 0.5)]
        vw_weight: f64,
    },
    /// Lexical-only (BM25) search.
    TextSearch {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Dense-only (cosine) search.
    VectorSearch {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        max_distance: Option<f32>,
    },
    /// Crawl one URL, or a bulk selection.
    Crawl {
        url: Option<String>,
        #[arg(long)]
        missing: bool,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        old: Option<i64>,
    },
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import links from a CSV file (`link,added_at,updated_at`).
    Migrate { csv_path: std::path::PathBuf },
    /// Run the JSON HTTP API.
    Serve,
}

#[derive(Subcommand)]
pub enum DbCommands {
    Init,
    Migrate,
    Status,
    Vector {
        #[command(subcommand)]
        command: VectorCommands,
    },
}

#[derive(Subcommand)]
pub enum VectorCommands {
    Init,
    Status,
    Embed {
        #[arg(short = 'n', long)]
        n: Option<i64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config);
    settings.ensure_database_dir()?;
    let store = Arc::new(Store::open(&settings.database_path)?);

    let embedder: Arc<dyn Embedder> = match &settings.embedder_base_url {
        Some(base_url) => Arc::new(HttpEmbedder::new(
            base_url.clone(),
            settings.embedder_api_key.clone(),
            settings.embedder_model.clone(),
        )),
        None => Arc::new(FakeEmbedder),
    };
    let search = Arc::new(SearchEngine::new(store.clone(), embedder.clone(), settings.cache_ttl_secs)?);
    let crawler = Arc::new(Crawler::new(store.clone(), BrowserFetcher::new(BrowserConfig::default())));
    let jobs = Arc::new(JobRunner::new());

    commands::dispatch(cli.command, store, search, crawler, embedder, jobs, settings).await
}
