//! Externalized word lists shared by the classifier and disclosure engine.
//!
//! These are runtime config assets rather than compiled constants so the
//! vocabulary can be tuned without a recompile, and so the classifier's
//! revision keywords and the disclosure engine's caveat phrases can draw
//! from one source where they overlap (e.g. "actually").

use serde::{Deserialize, Serialize};

/// Word lists the classifier and disclosure engine match against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Keywords that mark an explicit self-correction (→ REVISION).
    pub revision_keywords: Vec<String>,
    /// Keywords that mark a natural progression over time (→ TEMPORAL).
    pub progression_keywords: Vec<String>,
    /// Slot names treated as hierarchical for REFINEMENT detection
    /// (e.g. a city refines a region).
    pub hierarchical_slots: Vec<String>,
    /// Ordered chains of values that form a known seniority progression,
    /// per slot. A `(old, new)` pair where both appear in the same chain in
    /// that order counts as TEMPORAL even without a progression keyword.
    pub seniority_chains: Vec<SeniorityChain>,
    /// Phrases recognized both when detecting an existing caveat in
    /// generated text and when generating a new one to prepend.
    pub caveat_phrases: Vec<String>,
}

/// One named, ordered seniority progression for a single slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeniorityChain {
    /// The slot this chain applies to (e.g. `"title"`).
    pub slot: String,
    /// Values in increasing seniority order.
    pub chain: Vec<String>,
}

impl SeniorityChain {
    /// Returns true if `old` precedes `new` in this chain (a forward move).
    #[must_use]
    pub fn advances(&self, old: &str, new: &str) -> bool {
        let old = old.to_lowercase();
        let new = new.to_lowercase();
        let Some(old_pos) = self.chain.iter().position(|v| v.to_lowercase() == old) else {
            return false;
        };
        let Some(new_pos) = self.chain.iter().position(|v| v.to_lowercase() == new) else {
            return false;
        };
        new_pos > old_pos
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            revision_keywords: vec![
                "actually".into(),
                "correction".into(),
                "i meant".into(),
                "not".into(),
                "wrong".into(),
                "mistake".into(),
            ],
            progression_keywords: vec![
                "now".into(),
                "currently".into(),
                "promoted".into(),
                "became".into(),
                "these days".into(),
            ],
            hierarchical_slots: vec!["location".into()],
            seniority_chains: vec![SeniorityChain {
                slot: "title".into(),
                chain: vec![
                    "intern".into(),
                    "junior engineer".into(),
                    "engineer".into(),
                    "senior engineer".into(),
                    "staff engineer".into(),
                    "principal engineer".into(),
                    "engineering manager".into(),
                    "director".into(),
                ],
            }],
            caveat_phrases: vec![
                "most recent update".into(),
                "latest".into(),
                "though i have conflicting records".into(),
                "according to latest information".into(),
                "updated".into(),
                "previously".into(),
            ],
        }
    }
}
