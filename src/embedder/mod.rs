//! Turning text into vectors. The trait is the seam between the search layer
//! and whatever embedding backend is configured; `Http` talks to an
//! OpenAI-compatible `/embeddings` endpoint, `Fake` is a deterministic
//! stand-in used by tests and by deployments without a configured backend.

mod fake;
mod http;

pub use fake::FakeEmbedder;
pub use http::HttpEmbedder;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::document::EMBEDDING_DIM;

/// Input longer than this is truncated before being sent to any backend.
/// Long documents don't need their entire body embedded for search quality,
/// and this keeps request bodies and token costs bounded.
pub const MAX_INPUT_CHARS: usize = 30_000;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedder request failed: {0}")]
    Request(String),
    #[error("embedder returned {0}-dimensional vector, expected {EMBEDDING_DIM}")]
    WrongDimension(usize),
    #[error("embedder is not configured")]
    Unconfigured,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
