//! Dispatch for each CLI subcommand. Prints JSON-ish plain text; the kind of
//! pretty terminal rendering a human interactive session wants is explicitly
//! out of scope here.

use std::fs::File;
use std::io::BufRead;
use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::control;
use crate::crawler::Crawler;
use crate::embedder::Embedder;
use crate::jobs::{JobKind, JobRunner};
use crate::search::SearchEngine;
use crate::server::{self, AppState};
use crate::store::{CrawlSelector, Store};

use super::{Commands, DbCommands, VectorCommands};

pub async fn dispatch(
    command: Commands,
    store: Arc<Store>,
    search: Arc<SearchEngine>,
    crawler: Arc<Crawler>,
    embedder: Arc<dyn Embedder>,
    jobs: Arc<JobRunner>,
    settings: Settings,
) -> anyhow::Result<()> {
    match command {
        Commands::Add { url } => {
            let url = control::normalize_url(&url);
            let doc = store.insert(&url)?;
            search.on_document_changed(&doc)?;
            println!("added {} ({})", doc.url, doc.id);
        }
        Commands::List { page, limit, show_hidden } => {
            let (_, limit, offset) = control::paginate(page, limit);
            let (docs, total) = store.list(show_hidden, limit as i64, offset as i64)?;
            for doc in &docs {
                println!("{}\t{}\t{}", doc.id, doc.url, doc.title.as_deref().unwrap_or(""));
            }
            println!("-- {total} total");
        }
        Commands::Remove { target, glob } => {
            let removed = if glob {
                let n = store.remove_by_glob(&target)?;
                n > 0
            } else if let Some(doc) = store.get_by_id(&target)? {
                store.remove_by_id(&doc.id)?;
                search.on_document_removed(&doc.id)?;
                true
            } else {
                let url = control::normalize_url(&target);
                if let Some(doc) = store.get_by_url(&url)? {
                    store.remove_by_url(&url)?;
                    search.on_document_removed(&doc.id)?;
                    true
                } else {
                    false
                }
            };
            if glob {
                search.reindex_lexical()?;
                store.cache_invalidate_all()?;
            }
            println!("{}", if removed { "removed" } else { "not found" });
        }
        Commands::UpdateTimestamp { url } => {
            let url = control::normalize_url(&url);
            let updated = store.update_timestamp(&url)?;
            println!("{}", if updated { "updated" } else { "not found" });
        }
        Commands::CleanDuplicates => {
            let n = clean_duplicates(&store)?;
            println!("removed {n} duplicate(s)");
        }
        Commands::Search {
            query,
            page,
            limit,
            kw_weight,
            vw_weight,
        } => {
            let (_, limit, offset) = control::paginate(page, limit);
            let (hits, total) = search
                .hybrid_search(&query, kw_weight, vw_weight, limit as usize, offset as usize)
                .await?;
            for hit in &hits {
                println!("{}\t{}\t{:.4}", hit.id, hit.url, hit.rrf_score.unwrap_or(0.0));
            }
            println!("-- {total} total");
        }
        Commands::TextSearch { query, limit } => {
            let (_, limit, _) = control::paginate(None, limit);
            let hits = search.text_search(&query, limit as usize)?;
            for hit in &hits {
                println!("{}\t{}\t{:.4}", hit.id, hit.url, hit.score.unwrap_or(0.0));
            }
        }
        Commands::VectorSearch { query, limit, max_distance } => {
            let (_, limit, _) = control::paginate(None, limit);
            let hits = search.vector_search(&query, limit as usize, max_distance).await?;
            for hit in &hits {
                println!("{}\t{}\t{:.4}", hit.id, hit.url, hit.distance.unwrap_or(0.0));
            }
        }
        Commands::Crawl { url, missing, all, old } => {
            let selector = if let Some(url) = url {
                CrawlSelector::Url(control::normalize_url(&url))
            } else if all {
                CrawlSelector::All
            } else if let Some(days) = old {
                CrawlSelector::Old(days)
            } else if missing {
                CrawlSelector::Missing
            } else {
                CrawlSelector::Missing
            };
            run_crawl(&store, &search, &crawler, &jobs, selector).await?;
        }
        Commands::Db { command } => run_db_command(command, &store, &embedder, &jobs).await?,
        Commands::Migrate { csv_path } => {
            let (imported, skipped) = migrate_csv(&store, &csv_path)?;
            search.reindex_lexical()?;
            println!("imported {imported}, skipped {skipped}");
        }
        Commands::Serve => {
            let state = AppState {
                store,
                search,
                crawler,
                embedder,
                jobs,
                write_lock: Arc::new(tokio::sync::Mutex::new(())),
            };
            server::serve(settings, state).await?;
        }
    }
    Ok(())
}

async fn run_crawl(
    store: &Arc<Store>,
    search: &Arc<SearchEngine>,
    crawler: &Arc<Crawler>,
    jobs: &Arc<JobRunner>,
    selector: CrawlSelector,
) -> anyhow::Result<()> {
    let urls = store.list_to_crawl(&selector)?;
    let total = urls.len();
    let store = store.clone();
    let search = search.clone();
    let crawler = crawler.clone();
    jobs.start(JobKind::Crawl, urls, |u| u.clone(), move |url| {
        let store = store.clone();
        let search = search.clone();
        let crawler = crawler.clone();
        async move {
            let outcome = crawler.crawl_one(&url).await.map_err(|e| e.to_string())?;
            if let Some(doc) = store.get_by_url(&outcome.url).map_err(|e| e.to_string())? {
                search.on_document_changed(&doc).map_err(|e| e.to_string())?;
            }
            if outcome.success {
                Ok(())
            } else {
                Err(outcome.error.unwrap_or_else(|| "unknown crawl error".to_string()))
            }
        }
    })
    .await?;
    println!("crawl started for {total} url(s); poll `db status` for progress");
    Ok(())
}

async fn run_db_command(
    command: DbCommands,
    store: &Arc<Store>,
    embedder: &Arc<dyn Embedder>,
    jobs: &Arc<JobRunner>,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Init => {
            println!("database initialized at {}", store.path().display());
        }
        DbCommands::Migrate => {
            println!("schema is up to date");
        }
        DbCommands::Status => {
            let (_, total) = store.list(true, 1, 0)?;
            println!("{total} document(s)");
        }
        DbCommands::Vector { command } => match command {
            VectorCommands::Init => {
                let n = store.clear_all_embeddings()?;
                store.cache_invalidate_all()?;
                println!("cleared {n} embedding(s); re-run `db vector embed` to repopulate");
            }
            VectorCommands::Status => {
                let embedded = store.list_embedded()?.len();
                let pending = store.list_pending_embeddings(i64::MAX)?.len();
                println!("embedded {embedded}, pending {pending}");
            }
            VectorCommands::Embed { n } => {
                run_embed(store, embedder, jobs, n.unwrap_or(100)).await?;
            }
        },
    }
    Ok(())
}

async fn run_embed(store: &Arc<Store>, embedder: &Arc<dyn Embedder>, jobs: &Arc<JobRunner>, limit: i64) -> anyhow::Result<()> {
    let pending = store.list_pending_embeddings(limit)?;
    let total = pending.len();
    let store = store.clone();
    let embedder = embedder.clone();
    jobs.start(JobKind::Embed, pending, |(id, _)| id.clone(), move |(id, text)| {
        let store = store.clone();
        let embedder = embedder.clone();
        async move {
            let vector = embedder.embed(&text).await.map_err(|e| e.to_string())?;
            store.set_embedding(&id, Some(&vector)).map_err(|e| e.to_string())?;
            store.cache_invalidate_all().map_err(|e| e.to_string())?;
            info!(id, "embedded");
            Ok(())
        }
    })
    .await?;
    println!("embedding started for {total} document(s); poll `db vector status` for progress");
    Ok(())
}

fn clean_duplicates(store: &Store) -> anyhow::Result<usize> {
    let (docs, _) = store.list(true, i64::MAX, 0)?;
    let mut seen = std::collections::HashSet::new();
    let mut removed = 0;
    for doc in docs {
        if !seen.insert(doc.url.clone()) {
            store.remove_by_id(&doc.id)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Import `link,added_at,updated_at` rows, inserting new URLs and silently
/// skipping ones already present. No crawl state is carried over from the
/// import; imported links start as if freshly added.
fn migrate_csv(store: &Store, path: &std::path::Path) -> anyhow::Result<(usize, usize)> {
    let file = File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut imported = 0;
    let mut skipped = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i == 0 && line.to_lowercase().starts_with("link,") {
            continue;
        }
        let mut parts = line.splitn(3, ',');
        let Some(link) = parts.next() else { continue };
        if link.trim().is_empty() {
            continue;
        }
        match store.insert(link.trim()) {
            Ok(_) => imported += 1,
            Err(_) => skipped += 1,
        }
    }
    Ok((imported, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn clean_duplicates_keeps_first_occurrence() {
        let store = Store::open_in_memory().unwrap();
        store.insert("https://example.com/a").unwrap();
        let removed = clean_duplicates(&store).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn migrate_csv_skips_header_and_reports_counts() {
        let store = Store::open_in_memory().unwrap();
        store.insert("https://example.com/existing").unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "link,added_at,updated_at").unwrap();
        writeln!(file, "https://example.com/new,2024-01-01,2024-01-01").unwrap();
        writeln!(file, "https://example.com/existing,2024-01-01,2024-01-01").unwrap();

        let (imported, skipped) = migrate_csv(&store, file.path()).unwrap();
        assert_eq!(imported, 1);
        assert_eq!(skipped, 1);
    }
}
