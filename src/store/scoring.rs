//! Retrieval scoring: cosine similarity, keyword-overlap fallback, and
//! recency decay (§4.C).

use std::collections::HashSet;

/// Cosine similarity in `[-1.0, 1.0]`, or `0.0` for mismatched/zero-norm
/// vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Jaccard similarity between the lowercased token sets of two strings.
///
/// Substitutes for cosine similarity when the embedder is degraded (§4.H
/// failure semantics); trust and recency terms are unchanged.
#[must_use]
pub fn token_jaccard_similarity(a: &str, b: &str) -> f32 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    if union == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = intersection as f32 / union as f32;
        ratio
    }
}

/// Exponential recency decay: `exp(-age_seconds / half_life_seconds)`.
///
/// A pure, deterministic function of elapsed time so retrieval ranking has
/// no hidden dependence on insertion order.
#[must_use]
pub fn recency_decay(age_seconds: f64, half_life_seconds: f64) -> f32 {
    if half_life_seconds <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let decay = (-age_seconds / half_life_seconds).exp() as f32;
    decay.clamp(0.0, 1.0)
}

/// Composite retrieval score: `alpha * similarity + beta * trust + gamma * recency`.
#[must_use]
pub fn composite_score(similarity: f32, trust: f32, recency: f32, alpha: f32, beta: f32, gamma: f32) -> f32 {
    alpha * similarity + beta * trust + gamma * recency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-5);
    }

    #[test]
    fn cosine_mismatched_dims_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn jaccard_identical_sentences_is_one() {
        let sim = token_jaccard_similarity("i work at acme", "i work at acme");
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn jaccard_disjoint_sentences_is_zero() {
        assert_eq!(token_jaccard_similarity("hello world", "goodbye moon"), 0.0);
    }

    #[test]
    fn recency_decay_at_zero_age_is_one() {
        assert!((recency_decay(0.0, 86_400.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn recency_decay_shrinks_with_age() {
        let recent = recency_decay(60.0, 86_400.0);
        let old = recency_decay(86_400.0 * 30.0, 86_400.0);
        assert!(recent > old);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Cosine similarity never leaves [-1.0, 1.0] regardless of
            /// vector magnitude (P8's scoring terms must stay bounded for
            /// ranking to be a stable function of (cosine, trust, recency)).
            #[test]
            fn prop_cosine_similarity_is_bounded(
                a in prop::collection::vec(-1000.0f32..1000.0f32, 4),
                b in prop::collection::vec(-1000.0f32..1000.0f32, 4),
            ) {
                let sim = cosine_similarity(&a, &b);
                prop_assert!((-1.0..=1.0).contains(&sim));
            }

            /// Recency decay never leaves [0.0, 1.0].
            #[test]
            fn prop_recency_decay_is_bounded(
                age in 0.0f64..1_000_000_000.0f64,
                half_life in 1.0f64..1_000_000.0f64,
            ) {
                let decay = recency_decay(age, half_life);
                prop_assert!((0.0..=1.0).contains(&decay));
            }

            /// composite_score is a pure function of its scalar inputs: same
            /// arguments always produce the same score, so retrieval ranking
            /// never depends on insertion order (P8).
            #[test]
            fn prop_composite_score_is_deterministic(
                similarity in -1.0f32..1.0f32,
                trust in 0.0f32..1.0f32,
                recency in 0.0f32..1.0f32,
                alpha in 0.0f32..1.0f32,
                beta in 0.0f32..1.0f32,
                gamma in 0.0f32..1.0f32,
            ) {
                let first = composite_score(similarity, trust, recency, alpha, beta, gamma);
                let second = composite_score(similarity, trust, recency, alpha, beta, gamma);
                prop_assert_eq!(first, second);
            }
        }
    }
}
