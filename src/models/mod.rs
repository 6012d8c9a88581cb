//! Domain models shared across the store, search, and crawler layers.

pub mod cache;
pub mod document;

pub use cache::SearchCacheEntry;
pub use document::{Document, SearchHit};
