//! Shape of a memoized hybrid-search result page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SearchHit;

/// A materialized hybrid search result, keyed by query text + fusion weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCacheEntry {
    pub results: Vec<SearchHit>,
    pub total_count: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SearchCacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Normalize a query + weight pair into the triple that forms the cache key.
/// The query is lowercased and trimmed; weights participate as fixed
/// 2-decimal-precision numbers so that `0.5` and `0.50000001` collide.
pub fn cache_key(query: &str, keyword_weight: f64, vector_weight: f64) -> String {
    format!(
        "{}|{:.2}|{:.2}",
        query.trim().to_lowercase(),
        keyword_weight,
        vector_weight
    )
}
