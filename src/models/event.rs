//! Event log record types, consumed by the (out-of-scope) learning collaborator.

use super::memory::ThreadId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an event record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random event id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of event recorded at the end of an orchestrator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A reconstruction-gate decision was made.
    GateDecision,
    /// A contradiction was detected.
    Contradiction,
    /// A ledger entry was resolved.
    Resolution,
    /// A retrieval pass ran.
    Retrieval,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GateDecision => write!(f, "GATE_DECISION"),
            Self::Contradiction => write!(f, "CONTRADICTION"),
            Self::Resolution => write!(f, "RESOLUTION"),
            Self::Retrieval => write!(f, "RETRIEVAL"),
        }
    }
}

/// An append-only event record. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier for this event.
    pub event_id: EventId,
    /// The thread this event belongs to.
    pub thread_id: ThreadId,
    /// The kind of event.
    pub kind: EventKind,
    /// Opaque mapping of scalars and ids describing the event.
    pub payload: serde_json::Value,
    /// Creation timestamp (Unix epoch seconds).
    pub timestamp: u64,
}

impl EventRecord {
    /// Creates a new event record.
    #[must_use]
    pub fn new(
        thread_id: ThreadId,
        kind: EventKind,
        payload: serde_json::Value,
        timestamp: u64,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            thread_id,
            kind,
            payload,
            timestamp,
        }
    }
}
