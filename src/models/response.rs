//! Response classification, gate decisions, and disclosure mode types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of answer a turn is attempting to produce, which selects the
/// reconstruction-gate threshold row (§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// A short, specific answer (a name, a number, a single value).
    Factual,
    /// A "why"/"how" style answer that reasons about retrieved memories.
    Explanatory,
    /// Small talk with no grounding requirement.
    Conversational,
}

impl ResponseKind {
    /// Returns the kind as a static string slice, for metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Factual => "factual",
            Self::Explanatory => "explanatory",
            Self::Conversational => "conversational",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The final disclosure mode chosen for a turn's answer (§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseType {
    /// Answer grounded in belief-lane memories, possibly caveated.
    Belief,
    /// Ungrounded conversational fallback.
    Speech,
    /// Deterministic template listing competing beliefs; never picks a winner.
    Uncertainty,
}

impl ResponseType {
    /// Returns the mode as a static string slice, for metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Belief => "BELIEF",
            Self::Speech => "SPEECH",
            Self::Uncertainty => "UNCERTAINTY",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of running the reconstruction gates over a candidate answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateScores {
    /// Cosine of query embedding and answer embedding.
    pub intent_alignment: f32,
    /// Max cosine between answer embedding and any retrieved memory.
    pub memory_alignment: f32,
    /// Weighted mix of memory coverage, hallucination-risk complement, and
    /// extraction quality.
    pub grounding: f32,
}

/// Pass/fail result of the reconstruction gates, with a reason when failed.
///
/// This is the `{Pass | Fail(reason)}` result-variant re-architecture of the
/// original exception-based gate control flow (§9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateDecision {
    /// All thresholds for the response kind were met.
    Pass {
        /// The response kind the thresholds were evaluated against.
        kind: ResponseKind,
        /// The computed scores.
        scores: GateScores,
    },
    /// At least one threshold was missed, or a blocking contradiction forced
    /// failure regardless of scores.
    Fail {
        /// The response kind the thresholds were evaluated against.
        kind: ResponseKind,
        /// The computed scores (still reported, even on failure).
        scores: GateScores,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

impl GateDecision {
    /// Returns true if this decision is a pass.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Fail { reason, .. } => Some(reason.as_str()),
            Self::Pass { .. } => None,
        }
    }

    /// Returns the computed scores regardless of pass/fail.
    #[must_use]
    pub const fn scores(&self) -> &GateScores {
        match self {
            Self::Pass { scores, .. } | Self::Fail { scores, .. } => scores,
        }
    }
}
