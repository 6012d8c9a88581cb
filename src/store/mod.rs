//! Persistent storage: a single SQLite database holding documents and the
//! search-result cache. Mirrors the connection and retry discipline of the
//! original repository layer, generalized to one schema instead of many.

mod cache;
mod documents;
mod glob;
mod schema;

pub use documents::{CrawlSelector, CrawlUpdate, DocRef};
pub use glob::glob_to_like;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;
use tracing::warn;

/// Everything that can go wrong talking to the store, independent of any
/// particular backend. HTTP and CLI layers map these onto their own
/// vocabularies rather than leaking `rusqlite` types upward.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is not configured: {0}")]
    Unconfigured(String),
    #[error("store is unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("vector index is not initialized")]
    VectorNotInitialized,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Owns the single SQLite connection for this process. `rusqlite::Connection`
/// is `!Sync`, so callers share a `Store` behind a `tokio::sync::Mutex` or
/// run each operation on a blocking thread; `Store` itself stays plain so it
/// can be constructed and tested without an async runtime.
pub struct Store {
    path: PathBuf,
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path`, apply pragmas, and
    /// bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = connect(path)?;
        let store = Store {
            path: path.to_path_buf(),
            conn,
        };
        schema::init(&store.conn)?;
        Ok(store)
    }

    /// An in-memory store, used by tests and by `curio db vector status`-style
    /// dry runs that shouldn't touch disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Store {
            path: PathBuf::from(":memory:"),
            conn,
        };
        schema::init(&store.conn)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Open a connection with the pragmas a single-writer personal database
/// wants: WAL so reads don't block on a write, a generous busy timeout so
/// transient lock contention resolves itself instead of erroring out, and a
/// cache/mmap size sized for a corpus that comfortably fits on one disk.
fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("creating {}: {e}", parent.display())))?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 30000;
         PRAGMA cache_size = -64000;
         PRAGMA mmap_size = 268435456;
         PRAGMA temp_store = MEMORY;
         PRAGMA page_size = 4096;",
    )?;
    Ok(conn)
}

/// Retry an operation a handful of times with exponential backoff when
/// SQLite reports contention. Scoped to a single logical store operation
/// (e.g. one insert), never held across a caller's larger transaction.
pub(crate) fn with_retry<T, F>(mut f: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut delay = Duration::from_millis(100);
    let mut attempt = 0;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(StoreError::Database(e)) if attempt < 5 && is_busy(&e) => {
                attempt += 1;
                warn!(attempt, ?delay, "store busy, retrying");
                std::thread::sleep(delay);
                delay *= 2;
            }
            Err(StoreError::Database(e)) => return Err(StoreError::Database(e)),
            Err(other) => return Err(other),
        }
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked") || msg.contains("SQLITE_BUSY") || msg.contains("SQLITE_LOCKED")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_initializes_schema() {
        let store = Store::open_in_memory().unwrap();
        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("curio.db");
        let store = Store::open(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(store.path(), nested);
    }
}
