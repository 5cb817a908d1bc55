//! Classifier (§4.E): decides the relationship between an old and a new
//! fact on the same slot.

use crate::config::Vocabulary;
use crate::models::Topology;
use crate::store::scoring::cosine_similarity;

/// Input to a single classification decision.
pub struct ClassifyInput<'a> {
    /// The prior fact's source text.
    pub old_text: &'a str,
    /// The new utterance's source text.
    pub new_text: &'a str,
    /// The prior fact's embedding.
    pub old_vector: &'a [f32],
    /// The new fact's embedding.
    pub new_vector: &'a [f32],
    /// The prior fact's extracted value.
    pub old_value: &'a str,
    /// The new fact's extracted value.
    pub new_value: &'a str,
    /// The shared slot name.
    pub slot: &'a str,
}

/// The classified topology plus the semantic drift that produced it, so
/// callers can feed drift straight into trust evolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The winning topology, per the REVISION > REFINEMENT > TEMPORAL >
    /// CONFLICT tie-break order.
    pub topology: Topology,
    /// `1.0 - cos(old_vector, new_vector)`, clamped to `[0.0, 1.0]`.
    pub drift: f32,
}

/// Classifies the relationship between an old and a new fact (§4.E).
///
/// Tie-break order when more than one rule matches: REVISION precedes
/// REFINEMENT precedes TEMPORAL precedes CONFLICT.
#[must_use]
pub fn classify(input: &ClassifyInput<'_>, vocabulary: &Vocabulary) -> Classification {
    let similarity = cosine_similarity(input.old_vector, input.new_vector);
    let drift = (1.0 - similarity).clamp(0.0, 1.0);

    Classification {
        topology: resolve_topology(input, vocabulary),
        drift,
    }
}

fn resolve_topology(input: &ClassifyInput<'_>, vocabulary: &Vocabulary) -> Topology {
    if is_revision(input, vocabulary) {
        Topology::Revision
    } else if is_refinement(input, vocabulary) {
        Topology::Refinement
    } else if is_temporal(input, vocabulary) {
        Topology::Temporal
    } else {
        Topology::Conflict
    }
}

/// How many characters either side of `old_value`'s occurrence in the new
/// utterance still count as "adjacent" for a revision keyword.
const REVISION_ADJACENCY_WINDOW: usize = 30;

fn is_revision(input: &ClassifyInput<'_>, vocabulary: &Vocabulary) -> bool {
    let lower_new = input.new_text.to_lowercase();
    let old_value = input.old_value.to_lowercase();
    if old_value.is_empty() {
        return false;
    }

    let chars: Vec<char> = lower_new.chars().collect();
    let needle: Vec<char> = old_value.chars().collect();
    let Some(start) = chars.windows(needle.len()).position(|w| w == needle.as_slice()) else {
        return false;
    };
    let end = start + needle.len();
    let window_start = start.saturating_sub(REVISION_ADJACENCY_WINDOW);
    let window_end = (end + REVISION_ADJACENCY_WINDOW).min(chars.len());
    let window: String = chars[window_start..window_end].iter().collect();

    vocabulary.revision_keywords.iter().any(|kw| window.contains(kw.as_str()))
}

fn is_refinement(input: &ClassifyInput<'_>, vocabulary: &Vocabulary) -> bool {
    let old_value = input.old_value.to_lowercase();
    let new_value = input.new_value.to_lowercase();

    if old_value.is_empty() || new_value.is_empty() {
        return false;
    }
    if new_value.contains(&old_value) || old_value.contains(&new_value) {
        return true;
    }

    let similarity = cosine_similarity(input.old_vector, input.new_vector);
    let is_hierarchical = vocabulary
        .hierarchical_slots
        .iter()
        .any(|s| s.eq_ignore_ascii_case(input.slot));

    is_hierarchical && (0.7..0.9).contains(&similarity)
}

fn is_temporal(input: &ClassifyInput<'_>, vocabulary: &Vocabulary) -> bool {
    let lower_new = input.new_text.to_lowercase();
    if vocabulary.progression_keywords.iter().any(|kw| lower_new.contains(kw.as_str())) {
        return true;
    }

    vocabulary
        .seniority_chains
        .iter()
        .filter(|chain| chain.slot.eq_ignore_ascii_case(input.slot))
        .any(|chain| chain.advances(input.old_value, input.new_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::default()
    }

    #[test]
    fn revision_beats_everything_else() {
        let input = ClassifyInput {
            old_text: "I work at Acme",
            new_text: "Actually, not Acme, I work at Globex",
            old_vector: &[1.0, 0.0],
            new_vector: &[0.0, 1.0],
            old_value: "acme",
            new_value: "globex",
            slot: "employer",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Revision);
    }

    #[test]
    fn revision_keyword_far_from_old_value_is_not_revision() {
        // "actually" here is adjacent to the new value, not to "acme" (§4.E
        // rule 1 requires the keyword sit next to the *old* value).
        let input = ClassifyInput {
            old_text: "I work at Microsoft",
            new_text: "Actually, I work at Amazon",
            old_vector: &[1.0, 0.0],
            new_vector: &[0.0, 1.0],
            old_value: "microsoft",
            new_value: "amazon",
            slot: "employer",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Conflict);
    }

    #[test]
    fn refinement_when_value_contains_other() {
        let input = ClassifyInput {
            old_text: "I live in Colorado",
            new_text: "I live in Denver, Colorado",
            old_vector: &[0.9, 0.1],
            new_vector: &[0.85, 0.15],
            old_value: "colorado",
            new_value: "denver, colorado",
            slot: "location",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Refinement);
    }

    #[test]
    fn temporal_on_progression_keyword() {
        let input = ClassifyInput {
            old_text: "I was an engineer",
            new_text: "I am currently a staff engineer",
            old_vector: &[0.5, 0.5],
            new_vector: &[0.4, 0.6],
            old_value: "engineer",
            new_value: "staff engineer",
            slot: "title",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Temporal);
    }

    #[test]
    fn temporal_on_seniority_chain() {
        let input = ClassifyInput {
            old_text: "my title is engineer",
            new_text: "my title is staff engineer",
            old_vector: &[0.5, 0.5],
            new_vector: &[0.4, 0.6],
            old_value: "engineer",
            new_value: "staff engineer",
            slot: "title",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Temporal);
    }

    #[test]
    fn conflict_when_nothing_else_matches() {
        let input = ClassifyInput {
            old_text: "my favorite color is blue",
            new_text: "my favorite color is red",
            old_vector: &[1.0, 0.0],
            new_vector: &[0.0, 1.0],
            old_value: "blue",
            new_value: "red",
            slot: "favorite_color",
        };
        let result = classify(&input, &vocab());
        assert_eq!(result.topology, Topology::Conflict);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Reclassifying the same pair is deterministic: same topology,
            /// same drift, every time (P5).
            #[test]
            fn prop_classify_is_idempotent(
                old_value in "[a-z]{1,10}",
                new_value in "[a-z]{1,10}",
                old_text in "[a-z ]{1,40}",
                new_text in "[a-z ]{1,40}",
                old_vector in prop::collection::vec(-1.0f32..1.0f32, 4),
                new_vector in prop::collection::vec(-1.0f32..1.0f32, 4),
            ) {
                let vocabulary = Vocabulary::default();
                let input = ClassifyInput {
                    old_text: &old_text,
                    new_text: &new_text,
                    old_vector: &old_vector,
                    new_vector: &new_vector,
                    old_value: &old_value,
                    new_value: &new_value,
                    slot: "employer",
                };
                let first = classify(&input, &vocabulary);
                let second = classify(&input, &vocabulary);
                prop_assert_eq!(first, second);
            }

            /// Drift stays in [0.0, 1.0] no matter how the embeddings scale.
            #[test]
            fn prop_drift_is_bounded(
                old_vector in prop::collection::vec(-1000.0f32..1000.0f32, 3),
                new_vector in prop::collection::vec(-1000.0f32..1000.0f32, 3),
            ) {
                let vocabulary = Vocabulary::default();
                let input = ClassifyInput {
                    old_text: "x",
                    new_text: "y",
                    old_vector: &old_vector,
                    new_vector: &new_vector,
                    old_value: "a",
                    new_value: "b",
                    slot: "favorite_color",
                };
                let result = classify(&input, &vocabulary);
                prop_assert!((0.0..=1.0).contains(&result.drift));
            }
        }
    }
}
