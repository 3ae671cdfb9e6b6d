//! Cosine-similarity ranking over cached embeddings.

use std::cmp::Ordering;

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for empty vectors, mismatched lengths and zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Select the `k` most similar embeddings, then drop those scoring at or
/// below `min_score`.
///
/// Returns `(index, score)` pairs sorted by descending score. Equal scores
/// keep their original index order.
pub fn top_k(query: &[f32], embeddings: &[Vec<f32>], k: usize, min_score: f32) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = embeddings
        .iter()
        .enumerate()
        .map(|(i, embedding)| (i, cosine_similarity(query, embedding)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored.retain(|(_, score)| *score > min_score);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_any_dimensionality() {
        let a = vec![0.5; 384];
        let b = vec![0.25; 384];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_top_k_sorted_and_bounded() {
        let embeddings = vec![
            vec![0.0, 1.0],  // 0.0
            vec![1.0, 0.0],  // 1.0
            vec![1.0, 1.0],  // ~0.707
            vec![1.0, 0.2],  // ~0.98
        ];

        let ranked = top_k(&[1.0, 0.0], &embeddings, 3, 0.2);
        let indices: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 3, 2]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_floor_applies_after_truncation() {
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.1, 1.0], // ~0.0995, below the floor
            vec![0.0, 1.0],
        ];

        let ranked = top_k(&[1.0, 0.0], &embeddings, 2, 0.2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 0);
    }

    #[test]
    fn test_floor_is_strict() {
        let query = [1.0, 0.0];
        let embeddings = vec![vec![1.0, 1.0]];
        let score = cosine_similarity(&query, &embeddings[0]);

        assert!(top_k(&query, &embeddings, 3, score).is_empty());
        assert_eq!(top_k(&query, &embeddings, 3, score - 0.01).len(), 1);
    }

    #[test]
    fn test_ties_keep_cache_order() {
        let embeddings = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = top_k(&[1.0, 0.0], &embeddings, 2, 0.2);
        assert_eq!(ranked.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(top_k(&[1.0], &[], 3, 0.2).is_empty());
        assert!(top_k(&[1.0, 0.0], &[vec![1.0, 0.0]], 0, 0.2).is_empty());
    }
}
