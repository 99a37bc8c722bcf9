use std::future::Future;
use thiserror::Error;

/// Errors from the semantic similarity backend
///
/// The evaluator treats every variant the same way (interest factor degrades
/// to zero); the taxonomy exists so callers can log and count what went wrong.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Similarity service not configured: {0}")]
    Configuration(String),

    #[error("Similarity request failed: {0}")]
    Transport(String),

    #[error("Similarity API returned error: {0}")]
    Api(String),

    #[error("Invalid similarity response: {0}")]
    InvalidResponse(String),
}

/// Scores the semantic similarity of two free-text snippets
///
/// Implementations return a value in [0, 1]. The contract is fail-closed:
/// either input empty after trimming must yield 0 without touching the
/// backend.
pub trait InterestScorer: Send + Sync {
    fn score(
        &self,
        text_a: &str,
        text_b: &str,
    ) -> impl Future<Output = Result<f64, ScoringError>> + Send;
}

/// Cosine similarity between two embedding vectors, clamped to [0, 1]
///
/// Returns 0 when either vector has zero norm or the lengths differ, rather
/// than producing NaN.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    similarity.clamp(0.0, 1.0)
}

/// Round a similarity to 4 decimal places
///
/// The remote service is not bit-stable between calls; four decimals is the
/// stability the rest of the pipeline relies on.
#[inline]
pub fn round_similarity(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.5, 1.0, -0.25];
        let similarity = cosine_similarity(&v, &v);
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_opposite_vectors_clamped() {
        let a = vec![1.0, 1.0];
        let b = vec![-1.0, -1.0];
        // Raw cosine would be -1; the score space is [0, 1]
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_zero_norm() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_length_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_round_similarity_four_places() {
        assert_eq!(round_similarity(0.123456), 0.1235);
        assert_eq!(round_similarity(0.5), 0.5);
        assert_eq!(round_similarity(0.99999), 1.0);
    }
}
