//! Fact extractor: turns an utterance into zero-or-more typed facts.
//!
//! Pattern-based and deterministic by contract (§4.B); confidence returned
//! is a lower bound only, downstream trust evolution is what makes a fact
//! durable.

mod patterns;

use crate::models::{Fact, Polarity};
use patterns::SLOT_PATTERNS;

/// The closed set of recognized slot names. An extracted slot outside this
/// set is a validation failure and the tuple is dropped (§4.B); this cannot
/// happen from the built-in pattern table since it is closed by
/// construction, but callers that append custom patterns must still honor
/// this list.
pub const RECOGNIZED_SLOTS: &[&str] = &[
    "name",
    "employer",
    "title",
    "location",
    "programming_years",
    "first_language",
    "masters_school",
    "undergrad_school",
    "remote_preference",
    "team_size",
    "favorite_color",
];

/// Returns true if `slot` is in the closed recognized set.
#[must_use]
pub fn is_recognized_slot(slot: &str) -> bool {
    RECOGNIZED_SLOTS.contains(&slot)
}

/// Parses an utterance into zero-or-more `(slot, value, confidence)` facts.
///
/// Deterministic and side-effect free. At most one tuple per recognized slot
/// per call.
#[must_use]
pub fn extract(text: &str) -> Vec<Fact> {
    let lower = text.to_lowercase();
    let mut facts = Vec::new();

    for rule in SLOT_PATTERNS.iter() {
        let Some(captures) = rule.pattern.captures(&lower) else {
            continue;
        };
        let Some(value) = captures.get(1) else {
            continue;
        };
        let value = value.as_str().trim().trim_end_matches(['.', ',', '!', '?']);
        if value.is_empty() {
            continue;
        }
        if !is_recognized_slot(rule.slot) {
            // Defensive: the built-in table is closed, so this only guards
            // against a future rule addition with a typoed slot name.
            continue;
        }

        let polarity = detect_polarity(&lower, value);
        facts.push(Fact::new(rule.slot, value, rule.confidence).with_polarity(polarity));
    }

    facts
}

/// Returns true if `text` is a question rather than a statement.
///
/// Questions never create facts; they trigger retrieval instead (§4.B, §4.H
/// step 2).
#[must_use]
pub fn is_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.ends_with('?') {
        return true;
    }
    let lower = trimmed.to_lowercase();
    const INTERROGATIVES: &[&str] = &[
        "what", "where", "who", "when", "why", "how", "which", "do you", "did you", "can you",
        "is there", "are there",
    ];
    INTERROGATIVES
        .iter()
        .any(|w| lower.starts_with(w) || lower.starts_with(&format!("so {w}")))
}

/// Finds a polarity marker adjacent to the extracted value, for the
/// classifier's REVISION rule to consult later.
fn detect_polarity(lower_text: &str, value: &str) -> Polarity {
    let value_pos = lower_text.find(value).unwrap_or(0);
    let window_start = value_pos.saturating_sub(24);
    let window = &lower_text[window_start..value_pos];

    if window.contains("actually") || window.contains("i meant") || window.contains("correction")
    {
        Polarity::Actually
    } else if window.contains("instead") || window.contains("rather than") {
        Polarity::Instead
    } else if window.contains("not ") || window.contains("no longer") {
        Polarity::Not
    } else {
        Polarity::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_employer() {
        let facts = extract("I work at Acme Corp");
        assert!(facts.iter().any(|f| f.slot == "employer" && f.value == "acme corp"));
    }

    #[test]
    fn extracts_name() {
        let facts = extract("My name is Priya");
        assert!(facts.iter().any(|f| f.slot == "name" && f.value == "priya"));
    }

    #[test]
    fn extracts_location() {
        let facts = extract("I live in Denver");
        assert!(facts.iter().any(|f| f.slot == "location" && f.value == "denver"));
    }

    #[test]
    fn detects_revision_polarity() {
        let facts = extract("Actually I work at Globex now");
        let employer = facts.iter().find(|f| f.slot == "employer").unwrap();
        assert_eq!(employer.polarity, Polarity::Actually);
    }

    #[test]
    fn questions_are_not_statements() {
        assert!(is_question("Where do I work?"));
        assert!(is_question("What is my employer"));
        assert!(!is_question("I work at Acme"));
    }

    #[test]
    fn extracts_programming_years_from_a_short_correction() {
        let facts = extract("I've been programming for 8 years");
        assert!(facts.iter().any(|f| f.slot == "programming_years" && f.value == "8"));

        let facts = extract("12 years, not 8");
        assert!(facts.iter().any(|f| f.slot == "programming_years" && f.value == "12"));
    }

    #[test]
    fn extracts_remote_preference_with_intervening_words() {
        let facts = extract("I prefer working remotely");
        assert!(facts.iter().any(|f| f.slot == "remote_preference" && f.value == "remotely"));

        let facts = extract("I hate working remotely, I prefer being in the office");
        assert!(facts.iter().any(|f| f.slot == "remote_preference" && f.value == "in the office"));
    }

    #[test]
    fn unrecognized_text_yields_no_facts() {
        assert!(extract("hello there, how's it going").iter().all(|f| is_recognized_slot(&f.slot)));
    }
}
