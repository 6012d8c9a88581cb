//! Shared argument normalization and error translation for the CLI and HTTP
//! façades. Neither façade should contain business rules; this module holds
//! only the presentation-layer bits both share: clamping pagination,
//! defaulting a URL's scheme, and turning core errors into user-facing text.

use crate::crawler::CrawlError;
use crate::embedder::EmbedError;
use crate::search::SearchError;
use crate::store::StoreError;

pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;

/// Clamp `limit` into `[1, 100]` and `page` to at least `1`, then convert to
/// the `(limit, offset)` pair the core operations expect.
pub fn paginate(page: Option<u32>, limit: Option<u32>) -> (u32, u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(MIN_LIMIT, MAX_LIMIT);
    let offset = (page - 1) * limit;
    (page, limit, offset)
}

/// Prepend `https://` when the input has no scheme, so `curio add
/// example.com` and `curio add https://example.com` behave the same.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// The small, stable set of outcomes a façade needs to distinguish when
/// rendering an error, independent of which core component raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unconfigured,
    Unavailable,
    NotFound,
    AlreadyExists,
    VectorNotInitialized,
    Busy,
    Invalid,
}

pub fn classify_store_error(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Unconfigured(_) => ErrorKind::Unconfigured,
        StoreError::Unavailable(_) => ErrorKind::Unavailable,
        StoreError::NotFound(_) => ErrorKind::NotFound,
        StoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
        StoreError::VectorNotInitialized => ErrorKind::VectorNotInitialized,
        StoreError::Invalid(_) => ErrorKind::Invalid,
        StoreError::Database(_) | StoreError::Serialization(_) => ErrorKind::Unavailable,
    }
}

pub fn classify_search_error(e: &SearchError) -> ErrorKind {
    match e {
        SearchError::Store(inner) => classify_store_error(inner),
        SearchError::VectorNotInitialized => ErrorKind::VectorNotInitialized,
        SearchError::EmptyQuery => ErrorKind::Invalid,
        SearchError::Embed(_) | SearchError::Lexical(_) => ErrorKind::Unavailable,
    }
}

pub fn classify_crawl_error(_e: &CrawlError) -> ErrorKind {
    ErrorKind::Unavailable
}

pub fn classify_embed_error(e: &EmbedError) -> ErrorKind {
    match e {
        EmbedError::Unconfigured => ErrorKind::Unconfigured,
        EmbedError::Request(_) | EmbedError::WrongDimension(_) => ErrorKind::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_clamps_limit_and_defaults_page() {
        assert_eq!(paginate(None, None), (1, 20, 0));
        assert_eq!(paginate(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(paginate(Some(3), Some(500)), (3, 100, 200));
    }

    #[test]
    fn normalize_url_prepends_https_when_scheme_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("  example.com  "), "https://example.com");
    }
}
