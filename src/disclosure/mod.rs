//! Disclosure Engine (§4.G): picks the response mode before generation and
//! enforces the reintroduction caveat.

pub mod templates;

use crate::config::Vocabulary;
use crate::models::{GateDecision, RetrievedMemory};

/// The chosen disclosure mode and, for BELIEF, whether a caveat had to be
/// inserted mechanically because the generated text lacked one.
#[derive(Debug, Clone, PartialEq)]
pub enum Disclosure {
    /// Lists competing beliefs verbatim; the generated answer is discarded.
    Uncertainty(String),
    /// The generated answer stands, possibly wrapped with a caveat.
    Belief { text: String, caveat_inserted: bool },
    /// An ungrounded conversational fallback, explicitly marked as such.
    Speech(String),
}

/// Decides the disclosure mode and produces the final text (§4.G, §4.H
/// steps 7-8).
///
/// `retrieved` is the full retrieved-memory set for the turn, each tagged
/// with `reintroduced_claim`. `candidate_answer` is the generator's raw
/// output, already gate-scored via `gate_decision`.
#[must_use]
pub fn disclose(
    retrieved: &[RetrievedMemory],
    gate_decision: &GateDecision,
    candidate_answer: &str,
    vocabulary: &Vocabulary,
) -> Disclosure {
    let conflicting: Vec<RetrievedMemory> = retrieved
        .iter()
        .filter(|m| m.reintroduced_claim)
        .cloned()
        .collect();

    if !conflicting.is_empty() {
        return Disclosure::Uncertainty(templates::render_uncertainty(&conflicting));
    }

    if gate_decision.passed() {
        let needs_caveat = retrieved.iter().any(|m| m.reintroduced_claim);
        if needs_caveat && !templates::contains_caveat(candidate_answer, vocabulary) {
            return Disclosure::Belief {
                text: templates::prepend_caveat(candidate_answer, vocabulary),
                caveat_inserted: true,
            };
        }
        return Disclosure::Belief {
            text: candidate_answer.to_string(),
            caveat_inserted: false,
        };
    }

    Disclosure::Speech(format!("{candidate_answer} (ungrounded)"))
}

/// Verifies the invariant enforced by [`disclose`]: a BELIEF-mode answer
/// referencing a reintroduced claim must contain a caveat. Error responses
/// are exempt but must be marked as such (§4.G), so this check is only
/// meaningful for a non-error `Disclosure::Belief`.
#[must_use]
pub fn caveat_invariant_holds(retrieved: &[RetrievedMemory], disclosure: &Disclosure, vocabulary: &Vocabulary) -> bool {
    let Disclosure::Belief { text, .. } = disclosure else {
        return true;
    };
    if !retrieved.iter().any(|m| m.reintroduced_claim) {
        return true;
    }
    templates::contains_caveat(text, vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GateScores, Memory, MemoryLane, MemorySource, ResponseKind, ThreadId};

    fn sample_memory(text: &str, trust: f32) -> Memory {
        Memory {
            id: crate::models::MemoryId::new(),
            thread_id: ThreadId::new("t1"),
            text: text.to_string(),
            slot: Some("employer".to_string()),
            value: Some("acme".to_string()),
            lane: MemoryLane::Belief,
            source: MemorySource::User,
            vector: vec![1.0, 0.0],
            trust,
            confidence: 0.8,
            created_at: 1000,
        }
    }

    fn passing_decision() -> GateDecision {
        GateDecision::Pass {
            kind: ResponseKind::Factual,
            scores: GateScores {
                intent_alignment: 0.9,
                memory_alignment: 0.9,
                grounding: 0.9,
            },
        }
    }

    #[test]
    fn open_conflict_forces_uncertainty_regardless_of_gate() {
        let retrieved = vec![RetrievedMemory {
            memory: sample_memory("you work at Acme", 0.4),
            score: Some(0.5),
            reintroduced_claim: true,
        }];
        let result = disclose(&retrieved, &passing_decision(), "You work at Acme.", &Vocabulary::default());
        assert!(matches!(result, Disclosure::Uncertainty(_)));
    }

    #[test]
    fn belief_without_conflict_passes_through_unwrapped() {
        let retrieved = vec![RetrievedMemory {
            memory: sample_memory("you work at Acme", 0.7),
            score: Some(0.8),
            reintroduced_claim: false,
        }];
        let result = disclose(&retrieved, &passing_decision(), "You work at Acme.", &Vocabulary::default());
        assert_eq!(
            result,
            Disclosure::Belief {
                text: "You work at Acme.".to_string(),
                caveat_inserted: false
            }
        );
    }

    #[test]
    fn failing_gate_yields_speech() {
        let fail = GateDecision::Fail {
            kind: ResponseKind::Factual,
            scores: GateScores {
                intent_alignment: 0.1,
                memory_alignment: 0.1,
                grounding: 0.1,
            },
            reason: "too low".to_string(),
        };
        let result = disclose(&[], &fail, "I'm not sure.", &Vocabulary::default());
        assert!(matches!(result, Disclosure::Speech(_)));
    }

    #[test]
    fn invariant_check_catches_missing_caveat() {
        let disclosure = Disclosure::Belief {
            text: "You work at Acme.".to_string(),
            caveat_inserted: false,
        };
        let retrieved = vec![RetrievedMemory {
            memory: sample_memory("you work at Acme", 0.4),
            score: Some(0.5),
            reintroduced_claim: true,
        }];
        assert!(!caveat_invariant_holds(&retrieved, &disclosure, &Vocabulary::default()));
    }
}
