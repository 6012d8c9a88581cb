//! Search orchestration: lexical, dense, and RRF-fused hybrid retrieval,
//! each read through a cache where the mode supports one.

pub mod dense;
pub mod hybrid;
pub mod lexical;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use thiserror::Error;
use tracing::instrument;

use crate::embedder::{EmbedError, Embedder};
use crate::models::{Document, SearchCacheEntry, SearchHit};
use crate::store::{Store, StoreError};

use dense::DEFAULT_MAX_DISTANCE;
use lexical::LexicalIndex;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("embedder error: {0}")]
    Embed(#[from] EmbedError),
    #[error("lexical index error: {0}")]
    Lexical(#[from] tantivy::TantivyError),
    #[error("vector index is not initialized")]
    VectorNotInitialized,
    #[error("query must not be empty")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Hidden documents and ones whose last crawl returned an error status are
/// never surfaced by any search mode, no matter which candidate list found
/// them. The lexical index and the dense candidate scan both still see these
/// documents (a hide can't cheaply drop a row out of the tantivy index and
/// back in without losing its text), so this is the one place all three
/// retrieval paths converge to apply the rule.
fn is_excluded(doc: &Document) -> bool {
    doc.hidden || doc.http_status.is_some_and(|s| s >= 400)
}

/// Default time a hybrid search result page stays cached. Any mutation that
/// could change ranking (insert, remove, hide, crawl, embed) invalidates the
/// whole cache rather than tracking per-query staleness.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

pub struct SearchEngine {
    store: Arc<Store>,
    embedder: Arc<dyn Embedder>,
    lexical: LexicalIndex,
    cache_ttl_secs: i64,
}

impl SearchEngine {
    pub fn new(store: Arc<Store>, embedder: Arc<dyn Embedder>, cache_ttl_secs: i64) -> Result<Self> {
        let lexical = LexicalIndex::new()?;
        let engine = Self {
            store,
            embedder,
            lexical,
            cache_ttl_secs,
        };
        engine.reindex_lexical()?;
        Ok(engine)
    }

    /// Rebuild the in-memory lexical index from every document's current
    /// `search_text`. Cheap enough at personal-collection scale to call at
    /// startup and after bulk operations like `clean-duplicates`.
    pub fn reindex_lexical(&self) -> Result<()> {
        for (id, text) in self.store.list_for_lexical_reindex()? {
            self.lexical.upsert(&id, &text)?;
        }
        self.lexical.commit()?;
        Ok(())
    }

    /// Keep the lexical index in sync with a single document's current
    /// `search_text`, and drop any cached result page that might now be
    /// stale. Called after every store mutation that can change a document's
    /// visibility or text: insert, crawl, hide toggle, removal.
    pub fn on_document_changed(&self, doc: &Document) -> Result<()> {
        if doc.search_text.is_empty() {
            self.lexical.delete(&doc.id)?;
        } else {
            self.lexical.upsert(&doc.id, &doc.search_text)?;
        }
        self.lexical.commit()?;
        self.store.cache_invalidate_all()?;
        Ok(())
    }

    pub fn on_document_removed(&self, id: &str) -> Result<()> {
        self.lexical.delete(id)?;
        self.lexical.commit()?;
        self.store.cache_invalidate_all()?;
        Ok(())
    }

    /// Plain BM25 search, no caching. `score` is `-bm25_raw` so that, like
    /// the vector endpoint's distance, lower is better.
    #[instrument(skip(self))]
    pub fn text_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let hits = self.lexical.search(query, limit)?;
        self.hydrate(hits.into_iter().map(|h| (h.id, -h.bm25_raw, None)))
    }

    /// Plain cosine-distance search, no caching.
    #[instrument(skip(self))]
    pub async fn vector_search(&self, query: &str, limit: usize, max_distance: Option<f32>) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let embedded = self.store.list_embedded()?;
        if embedded.is_empty() {
            return Err(SearchError::VectorNotInitialized);
        }
        let query_vector = self.embedder.embed(query).await?;
        let candidates: Vec<(String, Vec<f32>)> = embedded
            .into_iter()
            .filter_map(|d| d.embedding.clone().map(|e| (d.id, e)))
            .collect();
        let hits = dense::nearest(&query_vector, &candidates, max_distance.unwrap_or(DEFAULT_MAX_DISTANCE), limit);
        self.hydrate(hits.into_iter().map(|h| (h.id, h.distance, Some(h.distance))))
    }

    /// Hybrid search: fuse lexical and dense rankings with RRF. The first
    /// page (`offset == 0`) of a given query/weight combination is served
    /// from and written back to the cache; later pages recompute, since
    /// caching a handful of hot first pages captures nearly all the benefit
    /// without needing a cache key per offset.
    #[instrument(skip(self))]
    pub async fn hybrid_search(
        &self,
        query: &str,
        keyword_weight: f64,
        vector_weight: f64,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<SearchHit>, usize)> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if offset == 0 {
            if let Some(entry) = self.store.cache_get(query, keyword_weight, vector_weight)? {
                let page = entry.results.into_iter().take(limit).collect();
                return Ok((page, entry.total_count));
            }
        }

        let lexical_hits = self.lexical.search(query, hybrid::TOP_N_PER_LIST)?;
        let embedded = self.store.list_embedded()?;
        let dense_hits = if embedded.is_empty() {
            vec![]
        } else {
            let query_vector = self.embedder.embed(query).await?;
            let candidates: Vec<(String, Vec<f32>)> = embedded
                .into_iter()
                .filter_map(|d| d.embedding.clone().map(|e| (d.id, e)))
                .collect();
            dense::rank_all(&query_vector, &candidates, hybrid::TOP_N_PER_LIST)
        };

        let fused = hybrid::fuse(&lexical_hits, &dense_hits, keyword_weight, vector_weight);
        let total_count = fused.len();
        let all_hits = self.hydrate_fused(fused)?;

        if offset == 0 {
            let now = Utc::now();
            let entry = SearchCacheEntry {
                results: all_hits.clone(),
                total_count,
                created_at: now,
                expires_at: now + ChronoDuration::seconds(self.cache_ttl_secs),
            };
            self.store.cache_put(query, keyword_weight, vector_weight, &entry)?;
        }

        let page = all_hits.into_iter().skip(offset).take(limit).collect();
        Ok((page, total_count))
    }

    fn hydrate(&self, hits: impl Iterator<Item = (String, f32, Option<f32>)>) -> Result<Vec<SearchHit>> {
        let mut out = Vec::new();
        for (id, score, distance) in hits {
            if let Some(doc) = self.store.get_by_id(&id)? {
                if is_excluded(&doc) {
                    continue;
                }
                out.push(SearchHit {
                    id: doc.id,
                    url: doc.url,
                    title: doc.title,
                    description: doc.description,
                    added_at: doc.added_at,
                    score: if distance.is_none() { Some(score) } else { None },
                    distance,
                    rrf_score: None,
                    vector_rank: None,
                    keyword_rank: None,
                });
            }
        }
        Ok(out)
    }

    fn hydrate_fused(&self, fused: Vec<hybrid::FusedHit>) -> Result<Vec<SearchHit>> {
        let mut out = Vec::with_capacity(fused.len());
        for hit in fused {
            if let Some(doc) = self.store.get_by_id(&hit.id)? {
                if is_excluded(&doc) {
                    continue;
                }
                out.push(SearchHit {
                    id: doc.id,
                    url: doc.url,
                    title: doc.title,
                    description: doc.description,
                    added_at: doc.added_at,
                    score: None,
                    distance: None,
                    rrf_score: Some(hit.rrf_score),
                    vector_rank: hit.vector_rank,
                    keyword_rank: hit.keyword_rank,
                });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::FakeEmbedder;

    fn engine() -> SearchEngine {
        let store = Arc::new(Store::open_in_memory().unwrap());
        SearchEngine::new(store, Arc::new(FakeEmbedder), DEFAULT_CACHE_TTL_SECS).unwrap()
    }

    #[test]
    fn text_search_rejects_empty_query() {
        let e = engine();
        assert!(matches!(e.text_search("", 10), Err(SearchError::EmptyQuery)));
    }

    #[test]
    fn text_search_finds_inserted_document() {
        let e = engine();
        let doc = e.store.insert("https://example.com/rust-guide").unwrap();
        e.store
            .crawl_update(
                &doc.url,
                &crate::store::CrawlUpdate {
                    title: Some("Rust Guide".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let updated = e.store.get_by_id(&doc.id).unwrap().unwrap();
        e.on_document_changed(&updated).unwrap();
        let hits = e.text_search("rust", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, doc.id);
    }

    #[tokio::test]
    async fn vector_search_without_embeddings_errors() {
        let e = engine();
        let err = e.vector_search("rust", 10, None).await.unwrap_err();
        assert!(matches!(err, SearchError::VectorNotInitialized));
    }

    #[tokio::test]
    async fn hybrid_search_caches_first_page() {
        let e = engine();
        let doc = e.store.insert("https://example.com/a").unwrap();
        e.store
            .crawl_update(
                &doc.url,
                &crate::store::CrawlUpdate {
                    title: Some("rust programming".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let updated = e.store.get_by_id(&doc.id).unwrap().unwrap();
        e.on_document_changed(&updated).unwrap();

        let (hits, total) = e.hybrid_search("rust", 0.5, 0.5, 10, 0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(total, 1);
        assert!(e.store.cache_get("rust", 0.5, 0.5).unwrap().is_some());
    }
}
