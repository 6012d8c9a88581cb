//! Deterministic embedder with no external dependency: hashes each token
//! into a bucket of a fixed-width vector and L2-normalizes the result. Not
//! meant to produce meaningful similarity judgements, only to exercise the
//! dense-retrieval and hybrid-fusion code paths without a network call.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{truncate_input, EmbedError, Embedder};
use crate::models::document::EMBEDDING_DIM;

#[derive(Default)]
pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let input = truncate_input(text);
        let mut vector = vec![0f32; EMBEDDING_DIM];
        for token in input.split_whitespace() {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = (u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize) % EMBEDDING_DIM;
            let sign = if digest[4] % 2 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let e = FakeEmbedder;
        let a = e.embed("hello world").await.unwrap();
        let b = e.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn output_has_expected_dimension_and_is_normalized() {
        let e = FakeEmbedder;
        let v = e.embed("hello world rust search").await.unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let e = FakeEmbedder;
        let v = e.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
