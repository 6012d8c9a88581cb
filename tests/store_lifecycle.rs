//! End-to-end exercise of the store against a real (temporary) SQLite file,
//! rather than the in-memory connection the unit tests use, to catch
//! anything specific to opening and reopening an on-disk database.

use curio::store::{CrawlUpdate, DocRef, Store};

#[test]
fn documents_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("curio.db");

    {
        let store = Store::open(&db_path).unwrap();
        store.insert("https://example.com/a").unwrap();
        store.insert("https://example.com/b").unwrap();
    }

    let store = Store::open(&db_path).unwrap();
    let (docs, total) = store.list(true, 10, 0).unwrap();
    assert_eq!(total, 2);
    assert_eq!(docs.len(), 2);
}

#[test]
fn full_crawl_and_hide_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("curio.db")).unwrap();

    let doc = store.insert("https://example.com/article").unwrap();
    assert!(doc.crawled_at.is_none());

    let (found, changed) = store
        .crawl_update(
            &doc.url,
            &CrawlUpdate {
                title: Some("An Article".into()),
                description: Some("About things".into()),
                content: Some("Body text here".into()),
                http_status: Some(200),
                crawl_error: None,
            },
        )
        .unwrap();
    assert!(found);
    assert!(changed);

    let crawled = store.get_by_id(&doc.id).unwrap().unwrap();
    assert_eq!(crawled.title.as_deref(), Some("An Article"));
    assert!(crawled.crawled_at.is_some());
    assert!(crawled.search_text.contains("Article"));

    let hidden = store.toggle_hidden(&DocRef::Url(doc.url.clone())).unwrap();
    assert_eq!(hidden, Some(true));
    let (visible, _) = store.list(false, 10, 0).unwrap();
    assert!(visible.is_empty());
}

#[test]
fn search_cache_invalidation_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("curio.db")).unwrap();

    let entry = curio::models::SearchCacheEntry {
        results: vec![],
        total_count: 0,
        created_at: chrono::Utc::now(),
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(3600),
    };
    store.cache_put("rust", 0.5, 0.5, &entry).unwrap();
    assert!(store.cache_get("rust", 0.5, 0.5).unwrap().is_some());

    store.insert("https://example.com/new").unwrap();
    store.cache_invalidate_all().unwrap();
    assert!(store.cache_get("rust", 0.5, 0.5).unwrap().is_none());
}
