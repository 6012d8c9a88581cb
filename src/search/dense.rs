//! Dense retrieval by brute-force cosine distance. A personal collection is
//! small enough (thousands, not millions, of documents) that scanning every
//! embedding on each query is simpler and more honest than standing up an
//! approximate nearest-neighbor index, and it makes results exactly
//! reproducible.

/// Default cutoff for standalone vector search: results farther than this
/// are considered irrelevant rather than merely "less relevant".
pub const DEFAULT_MAX_DISTANCE: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct DenseHit {
    pub id: String,
    pub distance: f32,
}

/// Cosine distance, `1 - cosine_similarity`, so `0.0` is identical and
/// larger is farther apart. Returns `1.0` (maximally distant) if either
/// vector is all zeros, since cosine similarity is undefined there.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Rank `candidates` by cosine distance to `query_vector`, keeping only
/// those within `max_distance`, closest first, truncated to `limit`.
pub fn nearest(query_vector: &[f32], candidates: &[(String, Vec<f32>)], max_distance: f32, limit: usize) -> Vec<DenseHit> {
    let mut hits: Vec<DenseHit> = candidates
        .iter()
        .map(|(id, v)| DenseHit {
            id: id.clone(),
            distance: cosine_distance(query_vector, v),
        })
        .filter(|h| h.distance <= max_distance)
        .collect();
    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

/// Rank every candidate by distance with no cutoff, for feeding the RRF
/// fusion step rather than presenting results directly to a user.
pub fn rank_all(query_vector: &[f32], candidates: &[(String, Vec<f32>)], limit: usize) -> Vec<DenseHit> {
    nearest(query_vector, candidates, f32::MAX, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = vec![1.0, 2.0, 3.0];
        assert!(cosine_distance(&v, &v) < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_distance_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_maximally_distant() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_distance(&a, &b), 1.0);
    }

    #[test]
    fn nearest_respects_max_distance_and_limit() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("close".to_string(), vec![1.0, 0.0]),
            ("far".to_string(), vec![0.0, 1.0]),
        ];
        let hits = nearest(&query, &candidates, 0.5, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "close");
    }
}
