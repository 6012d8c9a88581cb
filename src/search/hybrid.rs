//! Reciprocal Rank Fusion: combine a BM25 ranking and a cosine-distance
//! ranking into one ordering without needing the two scores to live on a
//! comparable scale.

use std::collections::HashMap;

use super::dense::DenseHit;
use super::lexical::LexicalHit;

/// Constant added to each rank before inverting it. Keeps the top rank's
/// contribution finite and lets a single list's influence taper off
/// gradually with depth rather than being dominated by rank 1 alone.
pub const RRF_K: f64 = 60.0;

/// Rank assigned to a document absent from a given list, standing in for
/// "arbitrarily far down a ranking this document never appeared in".
pub const ABSENT_RANK: u32 = 999;

/// Fused results below this score are dropped as noise rather than shown.
pub const MIN_SCORE: f64 = 0.005;

/// How many of each ranking's results participate in the fusion. Deep tails
/// of either list contribute negligibly once `RRF_K` damps them, so there's
/// no benefit to fusing more.
pub const TOP_N_PER_LIST: usize = 20;

#[derive(Debug, Clone)]
pub struct FusedHit {
    pub id: String,
    pub rrf_score: f64,
    pub keyword_rank: Option<u32>,
    pub vector_rank: Option<u32>,
}

/// A list a document is absent from contributes nothing to its score. The
/// `ABSENT_RANK` sentinel shows up in the carried `keyword_rank`/
/// `vector_rank` fields (via `fuse`), but never in this arithmetic.
fn rrf_term(weight: f64, rank: Option<u32>) -> f64 {
    match rank {
        Some(rank) => weight * (1.0 / (RRF_K + rank as f64)),
        None => 0.0,
    }
}

/// Fuse the two rankings. `keyword_weight`/`vector_weight` are typically
/// `0.5`/`0.5`, but callers may bias toward one signal. Ties in score break
/// by id for a deterministic order.
pub fn fuse(lexical: &[LexicalHit], dense: &[DenseHit], keyword_weight: f64, vector_weight: f64) -> Vec<FusedHit> {
    let mut keyword_ranks: HashMap<&str, u32> = HashMap::new();
    for (i, hit) in lexical.iter().take(TOP_N_PER_LIST).enumerate() {
        keyword_ranks.insert(&hit.id, (i + 1) as u32);
    }
    let mut vector_ranks: HashMap<&str, u32> = HashMap::new();
    for (i, hit) in dense.iter().take(TOP_N_PER_LIST).enumerate() {
        vector_ranks.insert(&hit.id, (i + 1) as u32);
    }

    let mut ids: Vec<&str> = keyword_ranks.keys().chain(vector_ranks.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    let mut fused: Vec<FusedHit> = ids
        .into_iter()
        .map(|id| {
            let keyword_rank = keyword_ranks.get(id).copied();
            let vector_rank = vector_ranks.get(id).copied();
            let rrf_score = rrf_term(keyword_weight, keyword_rank) + rrf_term(vector_weight, vector_rank);
            FusedHit {
                id: id.to_string(),
                rrf_score,
                keyword_rank: Some(keyword_rank.unwrap_or(ABSENT_RANK)),
                vector_rank: Some(vector_rank.unwrap_or(ABSENT_RANK)),
            }
        })
        .filter(|h| h.rrf_score >= MIN_SCORE)
        .collect();

    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_in_both_lists_outranks_single_list_hit() {
        let lexical = vec![
            LexicalHit { id: "a".into(), bm25_raw: 5.0 },
            LexicalHit { id: "b".into(), bm25_raw: 4.0 },
        ];
        let dense = vec![DenseHit { id: "a".into(), distance: 0.1 }];
        let fused = fuse(&lexical, &dense, 0.5, 0.5);
        assert_eq!(fused[0].id, "a");
        assert!(fused[0].rrf_score > fused[1].rrf_score);
    }

    #[test]
    fn absent_from_a_list_uses_sentinel_rank() {
        let lexical = vec![LexicalHit { id: "a".into(), bm25_raw: 5.0 }];
        let dense: Vec<DenseHit> = vec![];
        let fused = fuse(&lexical, &dense, 0.5, 0.5);
        assert_eq!(fused[0].keyword_rank, Some(1));
        assert_eq!(fused[0].vector_rank, Some(ABSENT_RANK));
        // The sentinel appears in the carried rank field, but a list a document
        // is absent from contributes 0 to the score, not `rrf_term(weight, ABSENT_RANK)`.
        let expected = 0.5 * (1.0 / (RRF_K + 1.0));
        assert!((fused[0].rrf_score - expected).abs() < 1e-12);
    }

    #[test]
    fn below_min_score_is_dropped() {
        let lexical: Vec<LexicalHit> = (1..=25)
            .map(|i| LexicalHit { id: format!("doc{i}"), bm25_raw: 1.0 })
            .collect();
        let dense: Vec<DenseHit> = vec![];
        let fused = fuse(&lexical, &dense, 0.5, 0.5);
        assert!(fused.iter().all(|h| h.rrf_score >= MIN_SCORE));
        assert!(fused.len() <= TOP_N_PER_LIST);
    }
}
