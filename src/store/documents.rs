//! Document CRUD, crawl bookkeeping and embedding storage.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::models::document::compute_search_text;
use crate::models::Document;

use super::{glob_to_like, with_retry, Result, Store, StoreError};

/// Which documents `list_to_crawl` should return.
#[derive(Debug, Clone)]
pub enum CrawlSelector {
    /// Never successfully crawled.
    Missing,
    /// Every document, regardless of crawl history.
    All,
    /// Crawled more than `days` ago, or never crawled.
    Old(i64),
    /// A single document by URL.
    Url(String),
}

/// Fields a crawl attempt may update. `None` means "leave unchanged" for
/// `title`/`description`/`content`; `http_status`/`crawl_error` always get
/// overwritten since every attempt, success or not, reports a fresh status.
#[derive(Debug, Clone, Default)]
pub struct CrawlUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub http_status: Option<i64>,
    pub crawl_error: Option<String>,
}

/// Which document a mutation targets.
#[derive(Debug, Clone)]
pub enum DocRef {
    Id(String),
    Url(String),
}

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let tags_json: String = row.get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let embedding: Option<Vec<u8>> = row.get("embedding")?;
    Ok(Document {
        id: row.get("id")?,
        url: row.get("url")?,
        title: row.get("title")?,
        description: row.get("description")?,
        content: row.get("content")?,
        notes: row.get("notes")?,
        tags,
        hidden: row.get::<_, i64>("hidden")? != 0,
        added_at: row.get("added_at")?,
        updated_at: row.get("updated_at")?,
        crawled_at: row.get("crawled_at")?,
        http_status: row.get("http_status")?,
        crawl_error: row.get("crawl_error")?,
        search_text: row.get("search_text")?,
        embedding: embedding.map(|bytes| decode_embedding(&bytes)),
    })
}

const DOCUMENT_COLUMNS: &str = "id, url, title, description, content, notes, tags, hidden, \
     added_at, updated_at, crawled_at, http_status, crawl_error, search_text, embedding";

fn encode_embedding(v: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(v.len() * 4);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl Store {
    /// Add a new curated link. Fails with `AlreadyExists` if the URL is
    /// already tracked; callers that want upsert semantics should `get_by_url`
    /// first.
    pub fn insert(&self, url: &str) -> Result<Document> {
        if url.trim().is_empty() {
            return Err(StoreError::Invalid("url must not be empty".into()));
        }
        if self.get_by_url(url)?.is_some() {
            return Err(StoreError::AlreadyExists(url.to_string()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let search_text = compute_search_text(url, None, None, None, None);
        with_retry(|| {
            self.conn().execute(
                "INSERT INTO documents (id, url, tags, hidden, added_at, updated_at, search_text)
                 VALUES (?1, ?2, '[]', 0, ?3, ?3, ?4)",
                params![id, url, now.to_rfc3339(), search_text],
            )?;
            Ok(())
        })?;
        self.get_by_id(&id)?.ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        self.conn()
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn get_by_url(&self, url: &str) -> Result<Option<Document>> {
        self.conn()
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE url = ?1"),
                params![url],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// List documents, most-recently-updated first, with hidden ones
    /// excluded unless asked for. Returns the page alongside the total
    /// matching count so callers can paginate without a second round trip.
    pub fn list(&self, include_hidden: bool, limit: i64, offset: i64) -> Result<(Vec<Document>, usize)> {
        let where_clause = if include_hidden { "1=1" } else { "hidden = 0" };
        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM documents WHERE {where_clause}"),
            [],
            |r| r.get(0),
        )?;
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE {where_clause} \
             ORDER BY updated_at DESC NULLS LAST LIMIT ?1 OFFSET ?2"
        ))?;
        let docs = stmt
            .query_map(params![limit, offset], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((docs, total as usize))
    }

    pub fn remove_by_url(&self, url: &str) -> Result<bool> {
        let n = self.conn().execute("DELETE FROM documents WHERE url = ?1", params![url])?;
        Ok(n > 0)
    }

    pub fn remove_by_id(&self, id: &str) -> Result<bool> {
        let n = self.conn().execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Remove every document whose URL matches a `*`/`?` glob. Returns the
    /// number of rows removed.
    pub fn remove_by_glob(&self, pattern: &str) -> Result<usize> {
        let (like, escape) = glob_to_like(pattern);
        let n = self.conn().execute(
            &format!("DELETE FROM documents WHERE url LIKE ?1 ESCAPE '{escape}'"),
            params![like],
        )?;
        Ok(n)
    }

    /// Bump `updated_at` to now without touching any content field. Used by
    /// `curio update-timestamp` to re-surface a link without re-crawling it.
    pub fn update_timestamp(&self, url: &str) -> Result<bool> {
        let n = self.conn().execute(
            "UPDATE documents SET updated_at = ?1 WHERE url = ?2",
            params![Utc::now().to_rfc3339(), url],
        )?;
        Ok(n > 0)
    }

    /// Flip `hidden` and return the new value, or `None` if no document
    /// matched `target`.
    pub fn toggle_hidden(&self, target: &DocRef) -> Result<Option<bool>> {
        let doc = match target {
            DocRef::Id(id) => self.get_by_id(id)?,
            DocRef::Url(url) => self.get_by_url(url)?,
        };
        let Some(doc) = doc else { return Ok(None) };
        let new_hidden = !doc.hidden;
        self.conn().execute(
            "UPDATE documents SET hidden = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_hidden as i64, Utc::now().to_rfc3339(), doc.id],
        )?;
        Ok(Some(new_hidden))
    }

    /// Apply a crawl attempt's results. Returns `(found, content_changed)`:
    /// `content_changed` is true when the resulting `content` differs from
    /// what was stored before, which is the embedding pipeline's cue to
    /// re-embed this document. `search_text` is always recomputed from the
    /// post-update fields so it never drifts from what's on the row.
    pub fn crawl_update(&self, url: &str, update: &CrawlUpdate) -> Result<(bool, bool)> {
        let Some(doc) = self.get_by_url(url)? else {
            return Ok((false, false));
        };
        let title = update.title.clone().or(doc.title.clone());
        let description = update.description.clone().or(doc.description.clone());
        let content = update.content.clone();
        let content_changed = content.is_some() && content != doc.content;
        let content = content.or(doc.content.clone());
        let search_text = compute_search_text(
            &doc.url,
            title.as_deref(),
            description.as_deref(),
            content.as_deref(),
            doc.notes.as_deref(),
        );
        let now = Utc::now();
        self.conn().execute(
            "UPDATE documents SET title = ?1, description = ?2, content = ?3, search_text = ?4, \
             http_status = ?5, crawl_error = ?6, crawled_at = ?7, updated_at = ?7 WHERE id = ?8",
            params![
                title,
                description,
                content,
                search_text,
                update.http_status,
                update.crawl_error,
                now.to_rfc3339(),
                doc.id,
            ],
        )?;
        if content_changed {
            self.conn()
                .execute("UPDATE documents SET embedding = NULL WHERE id = ?1", params![doc.id])?;
        }
        Ok((true, content_changed))
    }

    /// URLs due for crawling, per `selector`. Hidden documents are never
    /// selected by a bulk selector; `Url` is exempt since it names one
    /// document explicitly.
    pub fn list_to_crawl(&self, selector: &CrawlSelector) -> Result<Vec<String>> {
        let mut stmt;
        let rows = match selector {
            CrawlSelector::Missing => {
                stmt = self.conn().prepare(
                    "SELECT url FROM documents WHERE crawled_at IS NULL AND hidden = 0 \
                     ORDER BY added_at ASC",
                )?;
                stmt.query_map([], |r| r.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?
            }
            CrawlSelector::All => {
                stmt = self
                    .conn()
                    .prepare("SELECT url FROM documents WHERE hidden = 0 ORDER BY added_at ASC")?;
                stmt.query_map([], |r| r.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?
            }
            CrawlSelector::Old(days) => {
                let cutoff = Utc::now() - chrono::Duration::days(*days);
                stmt = self.conn().prepare(
                    "SELECT url FROM documents WHERE (crawled_at IS NULL OR crawled_at < ?1) AND hidden = 0 \
                     ORDER BY crawled_at ASC NULLS FIRST, added_at ASC",
                )?;
                stmt.query_map(params![cutoff.to_rfc3339()], |r| r.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?
            }
            CrawlSelector::Url(url) => {
                if self.get_by_url(url)?.is_some() {
                    vec![url.clone()]
                } else {
                    vec![]
                }
            }
        };
        Ok(rows)
    }

    /// Replace the stored embedding for a document. Passing `None` clears it,
    /// as happens automatically when a crawl changes the content.
    pub fn set_embedding(&self, id: &str, embedding: Option<&[f32]>) -> Result<()> {
        let bytes = embedding.map(encode_embedding);
        self.conn()
            .execute("UPDATE documents SET embedding = ?1 WHERE id = ?2", params![bytes, id])?;
        Ok(())
    }

    /// `(id, search_text)` pairs for documents that have text to embed but no
    /// embedding yet (or whose embedding was invalidated by a crawl).
    pub fn list_pending_embeddings(&self, limit: i64) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, search_text FROM documents WHERE embedding IS NULL \
             AND search_text != '' ORDER BY added_at ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every visible, non-error document that currently has an embedding,
    /// for the dense retrieval brute-force scan. Hidden documents and ones
    /// whose last crawl returned an error status are excluded, same as
    /// lexical and hybrid search.
    pub fn list_embedded(&self) -> Result<Vec<Document>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE embedding IS NOT NULL \
             AND hidden = 0 AND (http_status IS NULL OR http_status < 400)"
        ))?;
        let docs = stmt
            .query_map([], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Drop every stored embedding, forcing a full re-embed. Used by
    /// `curio db vector init` when the embedding dimension or model changes.
    pub fn clear_all_embeddings(&self) -> Result<usize> {
        Ok(self.conn().execute("UPDATE documents SET embedding = NULL", [])?)
    }

    /// All documents with non-empty `search_text`, for rebuilding the
    /// lexical index from scratch at startup.
    pub fn list_for_lexical_reindex(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, search_text FROM documents WHERE search_text != ''")?;
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let s = store();
        let doc = s.insert("https://example.com/a").unwrap();
        assert_eq!(s.get_by_id(&doc.id).unwrap().unwrap().url, doc.url);
        assert_eq!(s.get_by_url(&doc.url).unwrap().unwrap().id, doc.id);
    }

    #[test]
    fn insert_duplicate_url_fails() {
        let s = store();
        s.insert("https://example.com/a").unwrap();
        let err = s.insert("https://example.com/a").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn list_excludes_hidden_by_default() {
        let s = store();
        let doc = s.insert("https://example.com/a").unwrap();
        s.toggle_hidden(&DocRef::Id(doc.id.clone())).unwrap();
        let (visible, total) = s.list(false, 10, 0).unwrap();
        assert!(visible.is_empty());
        assert_eq!(total, 0);
        let (all, total) = s.list(true, 10, 0).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn crawl_update_clears_embedding_on_content_change() {
        let s = store();
        let doc = s.insert("https://example.com/a").unwrap();
        s.set_embedding(&doc.id, Some(&[1.0, 2.0])).unwrap();
        let (found, changed) = s
            .crawl_update(
                &doc.url,
                &CrawlUpdate {
                    content: Some("hello world".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(found);
        assert!(changed);
        assert!(s.get_by_id(&doc.id).unwrap().unwrap().embedding.is_none());
    }

    #[test]
    fn crawl_update_without_content_change_keeps_embedding() {
        let s = store();
        let doc = s.insert("https://example.com/a").unwrap();
        s.crawl_update(
            &doc.url,
            &CrawlUpdate {
                content: Some("hello world".into()),
                ..Default::default()
            },
        )
        .unwrap();
        s.set_embedding(&doc.id, Some(&[1.0, 2.0])).unwrap();
        let (_, changed) = s
            .crawl_update(
                &doc.url,
                &CrawlUpdate {
                    http_status: Some(200),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!changed);
        assert!(s.get_by_id(&doc.id).unwrap().unwrap().embedding.is_some());
    }

    #[test]
    fn remove_by_glob_matches_prefix() {
        let s = store();
        s.insert("https://example.com/a").unwrap();
        s.insert("https://example.com/b").unwrap();
        s.insert("https://other.com/a").unwrap();
        let removed = s.remove_by_glob("https://example.com/*").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(s.list(true, 10, 0).unwrap().1, 1);
    }

    #[test]
    fn embedding_roundtrips_through_blob_encoding() {
        let s = store();
        let doc = s.insert("https://example.com/a").unwrap();
        s.set_embedding(&doc.id, Some(&[0.5, -1.25, 3.0])).unwrap();
        let got = s.get_by_id(&doc.id).unwrap().unwrap();
        assert_eq!(got.embedding.unwrap(), vec![0.5, -1.25, 3.0]);
    }

    #[test]
    fn list_to_crawl_missing_excludes_already_crawled() {
        let s = store();
        let a = s.insert("https://example.com/a").unwrap();
        s.insert("https://example.com/b").unwrap();
        s.crawl_update(&a.url, &CrawlUpdate::default()).unwrap();
        let pending = s.list_to_crawl(&CrawlSelector::Missing).unwrap();
        assert_eq!(pending, vec!["https://example.com/b".to_string()]);
    }

    #[test]
    fn list_to_crawl_excludes_hidden_for_every_bulk_selector() {
        let s = store();
        let hidden = s.insert("https://example.com/hidden").unwrap();
        s.insert("https://example.com/visible").unwrap();
        s.toggle_hidden(&DocRef::Id(hidden.id.clone())).unwrap();

        assert_eq!(
            s.list_to_crawl(&CrawlSelector::Missing).unwrap(),
            vec!["https://example.com/visible".to_string()]
        );
        assert_eq!(
            s.list_to_crawl(&CrawlSelector::All).unwrap(),
            vec!["https://example.com/visible".to_string()]
        );
        assert_eq!(
            s.list_to_crawl(&CrawlSelector::Old(0)).unwrap(),
            vec!["https://example.com/visible".to_string()]
        );
        // A selector naming one URL by name is exempt from the hidden filter.
        assert_eq!(
            s.list_to_crawl(&CrawlSelector::Url(hidden.url.clone())).unwrap(),
            vec![hidden.url]
        );
    }

    #[test]
    fn list_orders_by_updated_at_descending() {
        let s = store();
        let a = s.insert("https://example.com/a").unwrap();
        let b = s.insert("https://example.com/b").unwrap();
        // Touch `a` after `b` was added, so `a` should now sort first despite
        // having been inserted first.
        s.update_timestamp(&a.url).unwrap();
        let (docs, _) = s.list(true, 10, 0).unwrap();
        assert_eq!(docs[0].id, a.id);
        assert_eq!(docs[1].id, b.id);
    }

    #[test]
    fn list_embedded_excludes_hidden_and_error_status() {
        let s = store();
        let ok = s.insert("https://example.com/ok").unwrap();
        s.set_embedding(&ok.id, Some(&[1.0])).unwrap();

        let hidden = s.insert("https://example.com/hidden").unwrap();
        s.set_embedding(&hidden.id, Some(&[1.0])).unwrap();
        s.toggle_hidden(&DocRef::Id(hidden.id.clone())).unwrap();

        let errored = s.insert("https://example.com/errored").unwrap();
        s.set_embedding(&errored.id, Some(&[1.0])).unwrap();
        s.crawl_update(
            &errored.url,
            &CrawlUpdate {
                http_status: Some(404),
                ..Default::default()
            },
        )
        .unwrap();

        let embedded = s.list_embedded().unwrap();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].id, ok.id);
    }
}
