//! Extracted fact types produced by the fact extractor.

use serde::{Deserialize, Serialize};

/// A polarity marker attached to an extracted fact by the extractor.
///
/// These mirror the keywords the classifier later looks for when deciding
/// between REVISION and CONFLICT; the extractor only records that a marker
/// was present, it does not itself classify anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// No polarity marker present.
    Plain,
    /// Negation marker ("not", "no longer", ...).
    Not,
    /// Self-correction marker ("actually", "I meant", ...).
    Actually,
    /// Substitution marker ("instead", "rather than", ...).
    Instead,
}

/// A single `(slot, value, confidence)` tuple extracted from an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// The recognized slot name (e.g. `"employer"`).
    pub slot: String,
    /// The extracted value (e.g. `"Amazon"`).
    pub value: String,
    /// The extractor's own certainty, a lower bound only (§4.B contract).
    pub confidence: f32,
    /// Polarity marker found adjacent to the value, if any.
    pub polarity: Polarity,
}

impl Fact {
    /// Creates a new fact with plain (unmarked) polarity.
    #[must_use]
    pub fn new(slot: impl Into<String>, value: impl Into<String>, confidence: f32) -> Self {
        Self {
            slot: slot.into(),
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            polarity: Polarity::Plain,
        }
    }

    /// Returns a copy of this fact with the given polarity marker.
    #[must_use]
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }
}
