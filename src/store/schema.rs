//! Schema bootstrap. A single idempotent `CREATE TABLE IF NOT EXISTS` batch,
//! matching the pattern the original repository layer used for its SQLite
//! side rather than a separate migration runner: this schema has had one
//! shape since the first release, so there is nothing to version yet.

use rusqlite::Connection;

use super::Result;

pub(super) fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            id              TEXT PRIMARY KEY,
            url             TEXT NOT NULL UNIQUE,
            title           TEXT,
            description     TEXT,
            content         TEXT,
            notes           TEXT,
            tags            TEXT NOT NULL DEFAULT '[]',
            hidden          INTEGER NOT NULL DEFAULT 0,
            added_at        TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            crawled_at      TEXT,
            http_status     INTEGER,
            crawl_error     TEXT,
            search_text     TEXT NOT NULL DEFAULT '',
            embedding       BLOB
         );
         CREATE INDEX IF NOT EXISTS idx_documents_hidden ON documents(hidden);
         CREATE INDEX IF NOT EXISTS idx_documents_crawled_at ON documents(crawled_at);

         CREATE TABLE IF NOT EXISTS search_cache (
            cache_key   TEXT PRIMARY KEY,
            payload     TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_search_cache_expires_at ON search_cache(expires_at);",
    )?;
    Ok(())
}
