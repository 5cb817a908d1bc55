//! Reconstruction Gates (§4.F): scores a candidate answer against the
//! retrieved memories before it is allowed to reach the user.

use crate::config::GateConfig;
use crate::models::{GateDecision, GateScores, ResponseKind};
use crate::store::scoring::{cosine_similarity, token_jaccard_similarity};

/// Classifies a query/answer pair into a [`ResponseKind`], which selects the
/// threshold row used by [`score`].
///
/// A pure function of the query and retrieved-memory shape: runs before
/// gate scoring so the right threshold row is known up front (§4.F).
#[must_use]
pub fn classify_response_kind(query: &str) -> ResponseKind {
    let lower = query.trim().to_lowercase();
    const FACTUAL_MARKERS: &[&str] = &[
        "what is", "what's", "who is", "who's", "where", "when", "how many", "how much", "which",
    ];
    const EXPLANATORY_MARKERS: &[&str] = &["why", "how do", "how does", "how did", "how should"];

    if FACTUAL_MARKERS.iter().any(|m| lower.contains(m)) {
        ResponseKind::Factual
    } else if EXPLANATORY_MARKERS.iter().any(|m| lower.contains(m)) {
        ResponseKind::Explanatory
    } else {
        ResponseKind::Conversational
    }
}

/// Scores a candidate answer and decides pass/fail against the threshold
/// row for `kind`.
///
/// `blocking_contradiction` forces a fail regardless of the computed
/// scores, matching the spec's "a contradiction of severity blocking forces
/// fail regardless of scores" rule.
#[must_use]
pub fn score(
    query_vector: &[f32],
    answer_vector: &[f32],
    answer_text: &str,
    answer_value: Option<&str>,
    retrieved_vectors: &[&[f32]],
    retrieved_values: &[&str],
    kind: ResponseKind,
    thresholds: &GateConfig,
    blocking_contradiction: bool,
) -> GateDecision {
    let intent_alignment = cosine_similarity(query_vector, answer_vector);

    let memory_alignment = if let (Some(value), true) = (
        answer_value,
        retrieved_values.iter().any(|v| answer_value == Some(*v)),
    ) {
        let _ = value;
        0.95
    } else {
        retrieved_vectors
            .iter()
            .map(|v| cosine_similarity(answer_vector, v))
            .fold(0.0_f32, f32::max)
    };

    let grounding = grounding_score(answer_text, retrieved_values);

    let scores = GateScores {
        intent_alignment,
        memory_alignment,
        grounding,
    };

    let row = match kind {
        ResponseKind::Factual => thresholds.factual,
        ResponseKind::Explanatory => thresholds.explanatory,
        ResponseKind::Conversational => thresholds.conversational,
    };

    if blocking_contradiction {
        return GateDecision::Fail {
            kind,
            scores,
            reason: "blocking contradiction present in retrieved memories".to_string(),
        };
    }

    let intent_ok = scores.intent_alignment >= row.intent;
    let memory_ok = scores.memory_alignment >= row.memory;
    let grounding_ok = row.grounding.map_or(true, |min| scores.grounding >= min);

    if intent_ok && memory_ok && grounding_ok {
        GateDecision::Pass { kind, scores }
    } else {
        let mut reasons = Vec::new();
        if !intent_ok {
            reasons.push(format!("intent_alignment {:.2} < {:.2}", scores.intent_alignment, row.intent));
        }
        if !memory_ok {
            reasons.push(format!("memory_alignment {:.2} < {:.2}", scores.memory_alignment, row.memory));
        }
        if !grounding_ok {
            if let Some(min) = row.grounding {
                reasons.push(format!("grounding {:.2} < {min:.2}", scores.grounding));
            }
        }
        GateDecision::Fail {
            kind,
            scores,
            reason: reasons.join("; "),
        }
    }
}

/// Weighted mix of memory coverage, hallucination-risk complement, and
/// extraction quality (§4.F).
fn grounding_score(answer_text: &str, retrieved_values: &[&str]) -> f32 {
    if retrieved_values.is_empty() {
        return 0.0;
    }

    let coverage = retrieved_values
        .iter()
        .map(|v| token_jaccard_similarity(answer_text, v))
        .fold(0.0_f32, f32::max);

    // Hallucination-risk heuristic: longer unsupported answers are riskier;
    // its complement rewards concise, memory-echoing answers.
    let token_count = answer_text.split_whitespace().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let hallucination_risk = (1.0 - coverage) * (token_count as f32 / (token_count as f32 + 20.0));
    let hallucination_complement = 1.0 - hallucination_risk;

    let extraction_quality = if coverage > 0.0 { 0.8 } else { 0.4 };

    (0.5 * coverage + 0.3 * hallucination_complement + 0.2 * extraction_quality).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> GateConfig {
        GateConfig::default()
    }

    #[test]
    fn factual_query_is_classified_factual() {
        assert_eq!(classify_response_kind("What is my employer?"), ResponseKind::Factual);
    }

    #[test]
    fn why_query_is_classified_explanatory() {
        assert_eq!(classify_response_kind("Why did I change jobs?"), ResponseKind::Explanatory);
    }

    #[test]
    fn small_talk_is_conversational() {
        assert_eq!(classify_response_kind("good morning!"), ResponseKind::Conversational);
    }

    #[test]
    fn blocking_contradiction_forces_fail() {
        let decision = score(
            &[1.0, 0.0],
            &[1.0, 0.0],
            "you work at Acme",
            Some("acme"),
            &[&[1.0, 0.0]],
            &["acme"],
            ResponseKind::Factual,
            &thresholds(),
            true,
        );
        assert!(!decision.passed());
    }

    #[test]
    fn well_grounded_factual_answer_passes() {
        let decision = score(
            &[1.0, 0.0],
            &[1.0, 0.0],
            "acme",
            Some("acme"),
            &[&[1.0, 0.0]],
            &["acme"],
            ResponseKind::Factual,
            &thresholds(),
            false,
        );
        assert!(decision.passed());
    }

    #[test]
    fn ungrounded_answer_fails() {
        let decision = score(
            &[1.0, 0.0],
            &[0.0, 1.0],
            "something entirely unrelated and unsupported by any memory at all",
            None,
            &[],
            &[],
            ResponseKind::Factual,
            &thresholds(),
            false,
        );
        assert!(!decision.passed());
    }
}
