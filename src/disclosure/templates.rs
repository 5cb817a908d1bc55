//! The small templating helper shared by caveat detection and generation,
//! and by the uncertainty template, so both draw from the same externalized
//! phrase list (§4.G).

use crate::config::Vocabulary;
use crate::models::RetrievedMemory;

/// Returns true if `text` already contains a recognized caveat phrase.
#[must_use]
pub fn contains_caveat(text: &str, vocabulary: &Vocabulary) -> bool {
    let lower = text.to_lowercase();
    vocabulary.caveat_phrases.iter().any(|phrase| lower.contains(phrase.as_str()))
}

/// Prepends a caveat phrase drawn from the vocabulary to `answer`.
///
/// Picks the first configured phrase deterministically rather than
/// selecting at random, so wrapped answers are reproducible for a given
/// vocabulary.
#[must_use]
pub fn prepend_caveat(answer: &str, vocabulary: &Vocabulary) -> String {
    let phrase = vocabulary
        .caveat_phrases
        .first()
        .map_or("previously", String::as_str);
    format!("(Note: {phrase} on this) {answer}")
}

/// Renders the deterministic UNCERTAINTY template: lists the competing
/// beliefs verbatim with their trust values and asks the user to
/// disambiguate. Never picks a winner (§4.G).
#[must_use]
pub fn render_uncertainty(conflicting: &[RetrievedMemory]) -> String {
    let mut out = String::from("I have conflicting memories on this:\n");
    for entry in conflicting {
        out.push_str(&format!(
            "- \"{}\" (trust {:.2})\n",
            entry.memory.text, entry.memory.trust
        ));
    }
    out.push_str("Which one is correct?");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_configured_phrase_case_insensitively() {
        let vocab = Vocabulary::default();
        assert!(contains_caveat("According to LATEST information, you work at Acme.", &vocab));
    }

    #[test]
    fn missing_phrase_is_not_detected() {
        let vocab = Vocabulary::default();
        assert!(!contains_caveat("You work at Acme.", &vocab));
    }

    #[test]
    fn prepend_adds_a_caveat_phrase() {
        let vocab = Vocabulary::default();
        let wrapped = prepend_caveat("You work at Acme.", &vocab);
        assert!(contains_caveat(&wrapped, &vocab));
    }
}
