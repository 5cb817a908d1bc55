//! # crt-engine
//!
//! A contradiction-preserving personal memory engine.
//!
//! The engine stores facts extracted from a conversation, detects when a new
//! fact contradicts, refines, or supersedes an older one, and discloses that
//! tension to the caller instead of silently picking a winner. Two lanes are
//! kept apart throughout: BELIEF memories (grounded facts, eligible for
//! prompt injection) and SPEECH memories (conversational filler, never
//! injected into a belief-mode prompt).
//!
//! ## Example
//!
//! ```rust,ignore
//! use crt_engine::{Orchestrator, ThreadId};
//!
//! let answer = orchestrator.handle_turn(&ThreadId::new("demo"), "I work at Acme").await?;
//! println!("{}", answer.text);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

pub mod classify;
pub mod cli;
pub mod config;
pub mod disclosure;
pub mod embedding;
pub mod extract;
pub mod gates;
pub mod generator;
pub mod io;
pub mod ledger;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod security;
pub mod store;
pub mod storage;

pub use config::RuntimeConfig;
pub use models::{
    ContradictionEntry, Fact, GateDecision, LedgerId, Memory, MemoryId, MemoryLane, MemorySource,
    ResponseType, RetrievedMemory, ThreadId, Topology,
};
pub use orchestrator::{CancellationToken, Orchestrator, ThreadProfile, TurnOutcome};

/// Error type for engine operations.
///
/// Variants mirror the four error kinds named by the engine's error-handling
/// design: transient collaborator failures are recovered locally and never
/// surface as this type (see [`embedding`] and [`generator`] resilience
/// wrappers); everything else that escapes a retry becomes one of these.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A collaborator (embedder or generator) failed after its local retry
    /// budget was exhausted.
    ///
    /// Raised when:
    /// - The embedder times out twice in a row.
    /// - The generator times out twice in a row, or returns a transport error.
    #[error("collaborator '{collaborator}' unavailable: {cause}")]
    Transient {
        /// The collaborator that failed (`"embedder"` or `"generator"`).
        collaborator: String,
        /// The underlying cause.
        cause: String,
    },

    /// An invariant the engine depends on was found broken at runtime.
    ///
    /// Raised when:
    /// - A memory is marked `reintroduced_claim` with no matching open
    ///   ledger entry.
    /// - A BELIEF-mode answer referencing a reintroduced claim was composed
    ///   without a caveat and could not be repaired by wrapping.
    ///
    /// This indicates a bug in the engine itself, not bad input. The turn
    /// must abort rather than paper over it.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Input could not be parsed or referenced an unrecognized asset.
    ///
    /// Raised when:
    /// - The fact extractor would produce a slot name outside the closed,
    ///   configured slot set.
    /// - A caller passes a malformed thread id or empty query.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The storage backend failed to commit a turn's writes.
    ///
    /// Raised when:
    /// - The underlying `SQLite` connection returns a write error.
    /// - A transaction could not be committed (disk full, lock contention).
    ///
    /// Turns abort cleanly on this error; no partial state is published.
    #[error("storage operation '{operation}' failed: {cause}")]
    Storage {
        /// The storage operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized so every module stamps `created_at`/`timestamp` fields the
/// same way instead of re-deriving it.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidInput("empty query".to_string());
        assert_eq!(err.to_string(), "invalid input: empty query");

        let err = Error::Storage {
            operation: "put".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "storage operation 'put' failed: disk full");
    }

    #[test]
    fn current_timestamp_is_reasonable() {
        let ts = current_timestamp();
        assert!(ts > 1_700_000_000);
    }
}
