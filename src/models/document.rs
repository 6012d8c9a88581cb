//! The Document is the central entity: one row per curated URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dense embedding dimension. Part of the external contract: changing this
/// invalidates every embedding already on disk.
pub const EMBEDDING_DIM: usize = 1536;

/// A curated link and everything derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub crawled_at: Option<DateTime<Utc>>,
    pub http_status: Option<i64>,
    pub crawl_error: Option<String>,
    /// Derived projection fed to the lexical index; recomputed by the store
    /// whenever any of its five source fields changes.
    pub search_text: String,
    /// Present iff an embedding was generated from the current `search_text`.
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Concatenate the five fields that make up `search_text`, replacing the
/// separator characters `. / - _ :` and the digraph `//` with a single
/// space. Null fields contribute empty strings.
pub fn compute_search_text(
    url: &str,
    title: Option<&str>,
    description: Option<&str>,
    content: Option<&str>,
    notes: Option<&str>,
) -> String {
    let joined = [url, title.unwrap_or(""), description.unwrap_or(""), content.unwrap_or(""), notes.unwrap_or("")]
        .join(" ");
    normalize_separators(&joined)
}

fn normalize_separators(s: &str) -> String {
    let replaced = s.replace("//", " ");
    replaced
        .chars()
        .map(|c| match c {
            '.' | '/' | '-' | '_' | ':' => ' ',
            other => other,
        })
        .collect()
}

/// A single search result, shaped to carry whichever ranking signals the
/// caller's retrieval mode produced. Unused fields are left `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub added_at: DateTime<Utc>,
    pub score: Option<f32>,
    pub distance: Option<f32>,
    pub rrf_score: Option<f64>,
    pub vector_rank: Option<u32>,
    pub keyword_rank: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_replaces_separators() {
        let text = compute_search_text(
            "https://example.com/a-b_c",
            Some("Hi: there."),
            None,
            None,
            None,
        );
        assert_eq!(text, "https  example com a b c Hi  there    ");
    }

    #[test]
    fn search_text_treats_null_fields_as_empty() {
        let text = compute_search_text("https://example.com", None, None, None, None);
        assert_eq!(text, "https  example com    ");
    }
}
