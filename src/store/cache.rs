//! Persistent cache for hybrid search result pages. Backed by a table
//! instead of an in-process map so a restarted process still benefits from
//! it, matching the "durable cache" shape used elsewhere in the store.

use chrono::Utc;
use rusqlite::params;
use sha2::{Digest, Sha256};

use crate::models::cache::cache_key;
use crate::models::SearchCacheEntry;

use super::{Result, Store};

fn hash_key(query: &str, keyword_weight: f64, vector_weight: f64) -> String {
    let key = cache_key(query, keyword_weight, vector_weight);
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(digest)
}

impl Store {
    /// Fetch a cached result page, if present and not expired. Expired
    /// entries are left in place for `purge_expired` to reap rather than
    /// deleted here, keeping this a pure read.
    pub fn cache_get(
        &self,
        query: &str,
        keyword_weight: f64,
        vector_weight: f64,
    ) -> Result<Option<SearchCacheEntry>> {
        let key = hash_key(query, keyword_weight, vector_weight);
        let payload: Option<String> = self
            .conn()
            .query_row(
                "SELECT payload FROM search_cache WHERE cache_key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional_or_none()?;
        let Some(payload) = payload else { return Ok(None) };
        let entry: SearchCacheEntry = serde_json::from_str(&payload)?;
        if entry.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    pub fn cache_put(
        &self,
        query: &str,
        keyword_weight: f64,
        vector_weight: f64,
        entry: &SearchCacheEntry,
    ) -> Result<()> {
        let key = hash_key(query, keyword_weight, vector_weight);
        let payload = serde_json::to_string(entry)?;
        self.conn().execute(
            "INSERT INTO search_cache (cache_key, payload, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET payload = excluded.payload,
                 created_at = excluded.created_at, expires_at = excluded.expires_at",
            params![
                key,
                payload,
                entry.created_at.to_rfc3339(),
                entry.expires_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Drop every cache entry. Called whenever a mutation could change search
    /// results: document add/remove/hide, crawl completion, embedding writes.
    pub fn cache_invalidate_all(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM search_cache", [])?)
    }

    /// Drop only entries past their `expires_at`. Cheap housekeeping that
    /// doesn't need to run on every mutation.
    pub fn cache_purge_expired(&self) -> Result<usize> {
        Ok(self
            .conn()
            .execute("DELETE FROM search_cache WHERE expires_at < ?1", params![Utc::now().to_rfc3339()])?)
    }
}

/// Small adapter so a missing row and a missing table both read as `None`
/// without forcing every caller to match on `rusqlite::Error::QueryReturnedNoRows`.
trait OptionalOrNone<T> {
    fn optional_or_none(self) -> Result<Option<T>>;
}

impl<T> OptionalOrNone<T> for rusqlite::Result<T> {
    fn optional_or_none(self) -> Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(now: chrono::DateTime<Utc>, ttl_secs: i64) -> SearchCacheEntry {
        SearchCacheEntry {
            results: vec![],
            total_count: 0,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn put_then_get_roundtrips() {
        let s = Store::open_in_memory().unwrap();
        let now = Utc::now();
        s.cache_put("rust search", 0.5, 0.5, &entry(now, 3600)).unwrap();
        let got = s.cache_get("rust search", 0.5, 0.5).unwrap();
        assert!(got.is_some());
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let s = Store::open_in_memory().unwrap();
        let now = Utc::now() - Duration::seconds(10);
        s.cache_put("rust search", 0.5, 0.5, &entry(now, 1)).unwrap();
        assert!(s.cache_get("rust search", 0.5, 0.5).unwrap().is_none());
    }

    #[test]
    fn invalidate_all_clears_table() {
        let s = Store::open_in_memory().unwrap();
        let now = Utc::now();
        s.cache_put("a", 0.5, 0.5, &entry(now, 3600)).unwrap();
        s.cache_put("b", 0.5, 0.5, &entry(now, 3600)).unwrap();
        assert_eq!(s.cache_invalidate_all().unwrap(), 2);
    }
}
