//! Contradiction ledger entry types.

use super::memory::{MemoryId, ThreadId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(String);

impl LedgerId {
    /// Creates a new random ledger id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LedgerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LedgerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of relationship between two successive facts on the same slot.
///
/// Tie-break order when more than one rule matches: REVISION precedes
/// REFINEMENT precedes TEMPORAL precedes CONFLICT (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topology {
    /// New fact narrows or adds detail to the old one without contradicting it.
    Refinement,
    /// The user explicitly self-corrected ("actually", "I meant", ...).
    Revision,
    /// The new fact reflects the natural progression of the old one over time.
    Temporal,
    /// The new fact is incompatible with the old one and neither explains the other.
    Conflict,
}

impl Topology {
    /// Returns the topology as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refinement => "REFINEMENT",
            Self::Revision => "REVISION",
            Self::Temporal => "TEMPORAL",
            Self::Conflict => "CONFLICT",
        }
    }

    /// Returns true if this topology requires opening an OPEN ledger entry
    /// and setting `reintroduced_claim` on the old memory (only CONFLICT).
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution status of a ledger entry.
///
/// Only `status` and `resolved_at` may change after creation (invariant 4);
/// `topology` and the memory ids are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Unresolved; still in effect.
    Open,
    /// The user explicitly disambiguated.
    ResolvedByUser,
    /// Resolved automatically in favor of the more recent fact.
    ResolvedByRecency,
    /// Superseded by a later ledger entry covering the same slot.
    Superseded,
}

impl Status {
    /// Returns true if this status counts as resolved (not OPEN).
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::ResolvedByUser => write!(f, "RESOLVED_BY_USER"),
            Self::ResolvedByRecency => write!(f, "RESOLVED_BY_RECENCY"),
            Self::Superseded => write!(f, "SUPERSEDED"),
        }
    }
}

/// How a ledger entry was resolved, for audit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMethod {
    /// The user explicitly picked a value.
    UserClarification,
    /// Resolved automatically because a later entry covers the same slot.
    Recency,
    /// Superseded by a newer entry with user confirmation.
    Superseded,
}

/// A durable record of a detected contradiction between two memories.
///
/// The ledger is strictly append-only: once created, `topology`,
/// `old_memory_id`, and `new_memory_id` never change (invariant 4, P6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionEntry {
    /// Unique identifier for this entry.
    pub ledger_id: LedgerId,
    /// The thread this contradiction belongs to.
    pub thread_id: ThreadId,
    /// The earlier, pre-existing memory.
    pub old_memory_id: MemoryId,
    /// The newer memory that triggered classification.
    pub new_memory_id: MemoryId,
    /// The classified relationship between old and new.
    pub topology: Topology,
    /// Current resolution status.
    pub status: Status,
    /// Semantic distance between old and new in `[0.0, 1.0]`.
    pub drift: f32,
    /// Change in confidence between old and new fact extraction.
    pub confidence_delta: f32,
    /// Short human-readable description.
    pub summary: String,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
    /// Resolution timestamp (Unix epoch seconds), if resolved.
    pub resolved_at: Option<u64>,
}

impl ContradictionEntry {
    /// Creates a new OPEN ledger entry.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        thread_id: ThreadId,
        old_memory_id: MemoryId,
        new_memory_id: MemoryId,
        topology: Topology,
        drift: f32,
        confidence_delta: f32,
        summary: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            ledger_id: LedgerId::new(),
            thread_id,
            old_memory_id,
            new_memory_id,
            topology,
            status: Status::Open,
            drift: drift.clamp(0.0, 1.0),
            confidence_delta,
            summary: summary.into(),
            created_at,
            resolved_at: None,
        }
    }

    /// Returns true if this entry is an OPEN CONFLICT (the condition that
    /// sets `reintroduced_claim` on the referenced memories, invariant 3).
    #[must_use]
    pub fn is_open_conflict(&self) -> bool {
        self.status == Status::Open && self.topology == Topology::Conflict
    }
}
