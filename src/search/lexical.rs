//! BM25 lexical retrieval over `search_text`, backed by an in-memory
//! tantivy index. At personal-collection scale a RAM index rebuilt at
//! startup and kept current with targeted upserts/deletes is simpler and
//! plenty fast; there's no case here for an on-disk index or a background
//! merge policy.

use std::sync::Mutex;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Schema, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexWriter, Term};

/// A single ranked lexical hit. `score` is tantivy's raw BM25 score (higher
/// is more relevant); callers that want "lower is better" negate it, per the
/// convention used for the standalone text-search endpoint.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub id: String,
    pub bm25_raw: f32,
}

pub struct LexicalIndex {
    index: Index,
    id_field: tantivy::schema::Field,
    text_field: tantivy::schema::Field,
    writer: Mutex<IndexWriter>,
}

impl LexicalIndex {
    pub fn new() -> tantivy::Result<Self> {
        let mut builder = Schema::builder();
        let id_field = builder.add_text_field("id", STRING | STORED);
        let text_field = builder.add_text_field("search_text", TEXT);
        let schema = builder.build();
        let index = Index::create_in_ram(schema);
        let writer = index.writer(15_000_000)?;
        Ok(Self {
            index,
            id_field,
            text_field,
            writer: Mutex::new(writer),
        })
    }

    /// Insert or replace the indexed text for `id`. Callers are responsible
    /// for calling `commit` once after a batch of upserts.
    pub fn upsert(&self, id: &str, search_text: &str) -> tantivy::Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.delete_term(Term::from_field_text(self.id_field, id));
        writer.add_document(doc!(
            self.id_field => id,
            self.text_field => search_text,
        ))?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> tantivy::Result<()> {
        let writer = self.writer.lock().unwrap();
        writer.delete_term(Term::from_field_text(self.id_field, id));
        Ok(())
    }

    pub fn commit(&self) -> tantivy::Result<()> {
        self.writer.lock().unwrap().commit()?;
        Ok(())
    }

    /// Top `limit` documents for `query`, ranked by BM25 descending.
    pub fn search(&self, query: &str, limit: usize) -> tantivy::Result<Vec<LexicalHit>> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(vec![]);
        }
        let reader = self.index.reader()?;
        let searcher = reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let parsed = match parser.parse_query(query) {
            Ok(q) => q,
            Err(_) => return Ok(vec![]),
        };
        let top = searcher.search(&parsed, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top.len());
        for (score, addr) in top {
            let retrieved = searcher.doc::<tantivy::TantivyDocument>(addr)?;
            if let Some(id) = retrieved
                .get_first(self.id_field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
            {
                hits.push(LexicalHit { id, bm25_raw: score });
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_document_by_term() {
        let idx = LexicalIndex::new().unwrap();
        idx.upsert("1", "rust programming language").unwrap();
        idx.upsert("2", "python programming language").unwrap();
        idx.commit().unwrap();
        let hits = idx.search("rust", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn upsert_replaces_previous_text() {
        let idx = LexicalIndex::new().unwrap();
        idx.upsert("1", "rust").unwrap();
        idx.commit().unwrap();
        idx.upsert("1", "python").unwrap();
        idx.commit().unwrap();
        assert!(idx.search("rust", 10).unwrap().is_empty());
        assert_eq!(idx.search("python", 10).unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_from_results() {
        let idx = LexicalIndex::new().unwrap();
        idx.upsert("1", "rust").unwrap();
        idx.commit().unwrap();
        idx.delete("1").unwrap();
        idx.commit().unwrap();
        assert!(idx.search("rust", 10).unwrap().is_empty());
    }
}
