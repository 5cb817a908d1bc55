//! Memory and identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Creates a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Scoping key for one logical user conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Creates a thread id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Two-lane separation between grounded facts and conversational filler.
///
/// Speech-lane memories are never injected into belief prompts (invariant 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryLane {
    /// Grounded fact, eligible for prompt injection.
    Belief,
    /// Conversational filler, never used to ground an answer.
    Speech,
}

impl fmt::Display for MemoryLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Belief => write!(f, "belief"),
            Self::Speech => write!(f, "speech"),
        }
    }
}

/// Provenance of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    /// Entered by the end user.
    User,
    /// Generated by the system (e.g. the composer).
    System,
    /// Ingested from an external document.
    Doc,
    /// Supplied by an external integration.
    External,
}

impl fmt::Display for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
            Self::Doc => write!(f, "doc"),
            Self::External => write!(f, "external"),
        }
    }
}

/// A trust-weighted memory entry.
///
/// `text` is immutable for the life of the memory (invariant 1). `trust` may
/// only change through the evolution rules in [`crate::store::trust`]
/// (invariant 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier, stable for life.
    pub id: MemoryId,
    /// Scoping key for the owning conversation.
    pub thread_id: ThreadId,
    /// Verbatim utterance substring this memory was extracted from.
    pub text: String,
    /// Recognized slot name, if this memory represents an extracted fact.
    pub slot: Option<String>,
    /// Extracted value for `slot`, if present.
    pub value: Option<String>,
    /// Belief vs. speech lane.
    pub lane: MemoryLane,
    /// Where this memory came from.
    pub source: MemorySource,
    /// Fixed-dimension embedding, or empty when running in keyword-only mode.
    pub vector: Vec<f32>,
    /// Trust in `[0.0, 1.0]`.
    pub trust: f32,
    /// The extractor's own certainty, `[0.0, 1.0]`.
    pub confidence: f32,
    /// Monotonic creation timestamp (Unix epoch seconds).
    pub created_at: u64,
}

impl Memory {
    /// Creates a new memory for a user-asserted fact with the default
    /// initial trust of 0.5.
    #[must_use]
    pub fn new_user_fact(
        thread_id: ThreadId,
        text: impl Into<String>,
        slot: impl Into<String>,
        value: impl Into<String>,
        confidence: f32,
        vector: Vec<f32>,
        created_at: u64,
    ) -> Self {
        Self {
            id: MemoryId::new(),
            thread_id,
            text: text.into(),
            slot: Some(slot.into()),
            value: Some(value.into()),
            lane: MemoryLane::Belief,
            source: MemorySource::User,
            vector,
            trust: 0.5,
            confidence: confidence.clamp(0.0, 1.0),
            created_at,
        }
    }

    /// Creates a new speech-lane memory for an utterance with no extracted fact.
    #[must_use]
    pub fn new_speech(
        thread_id: ThreadId,
        text: impl Into<String>,
        vector: Vec<f32>,
        created_at: u64,
    ) -> Self {
        Self {
            id: MemoryId::new(),
            thread_id,
            text: text.into(),
            slot: None,
            value: None,
            lane: MemoryLane::Speech,
            source: MemorySource::User,
            vector,
            trust: 0.5,
            confidence: 0.3,
            created_at,
        }
    }
}

/// A memory annotated with whether it currently participates in an open
/// CONFLICT (the `reintroduced_claim` derived boolean, invariant 3).
///
/// This is never persisted; it is computed on read by joining against the
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedMemory {
    /// The underlying memory.
    pub memory: Memory,
    /// Composite retrieval score, if this came from a ranked search.
    pub score: Option<f32>,
    /// True iff this memory participates in an open CONFLICT (invariant 3).
    pub reintroduced_claim: bool,
}
