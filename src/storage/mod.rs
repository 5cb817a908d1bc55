//! Persisted state: the four tables named in the storage-backend contract
//! (`memories`, `contradictions`, `events`, `trust_history`).
//!
//! A single backend trait covers all four tables rather than the three
//! separate persistence/index/vector layers a full-text search product
//! needs; this engine's only query shapes are by-id, by-thread, and
//! by-(thread, slot) lookups plus a full per-thread scan for retrieval
//! scoring, all of which one `SQLite` connection handles directly.

mod connection;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::models::{ContradictionEntry, EventRecord, LedgerId, Memory, MemoryId, ThreadId};
use crate::Result;

/// A row appended to `trust_history` each time [`StorageBackend::set_trust`]
/// runs, so trust monotonicity is auditable without replaying the ledger.
#[derive(Debug, Clone)]
pub struct TrustHistoryEntry {
    /// The memory whose trust changed.
    pub memory_id: MemoryId,
    /// The trust value after the change.
    pub trust: f32,
    /// Short machine-readable reason (e.g. `"CONFLICT"`, `"reinforcement"`).
    pub reason: String,
    /// When the change was recorded (Unix epoch seconds).
    pub recorded_at: u64,
}

/// Storage backend for the engine's four persisted tables.
///
/// Implementors commit each call (or each turn's batch of calls, via
/// [`StorageBackend::transaction`]) atomically: callers never observe a
/// partially-written turn.
pub trait StorageBackend: Send + Sync {
    /// Inserts or replaces a memory row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put_memory(&self, memory: &Memory) -> Result<()>;

    /// Fetches a memory by id. Returns `Ok(None)` for an unknown id, never
    /// an error (§4.C failure modes).
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_memory(&self, id: &MemoryId) -> Result<Option<Memory>>;

    /// Returns all memories for a thread, any lane, unordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_memories(&self, thread_id: &ThreadId) -> Result<Vec<Memory>>;

    /// Returns all memories for a thread with the given slot, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_memories_by_slot(&self, thread_id: &ThreadId, slot: &str) -> Result<Vec<Memory>>;

    /// Atomically sets a memory's trust value and appends the matching
    /// `trust_history` row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the memory does not exist.
    fn set_trust(&self, memory_id: &MemoryId, trust: f32, reason: &str, now: u64) -> Result<()>;

    /// Appends a new, `OPEN` ledger entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put_contradiction(&self, entry: &ContradictionEntry) -> Result<()>;

    /// Transitions a ledger entry's status in place, leaving `topology` and
    /// the referenced memory ids untouched (append-only integrity).
    ///
    /// Idempotent: resolving an already-resolved entry is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the entry does not exist.
    fn resolve_contradiction(
        &self,
        ledger_id: &LedgerId,
        status: crate::models::Status,
        resolved_at: u64,
    ) -> Result<()>;

    /// Returns true if any `OPEN`/`CONFLICT` entry references `memory_id` as
    /// either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn has_open_conflict(&self, memory_id: &MemoryId) -> Result<bool>;

    /// Returns all unresolved (`OPEN`) ledger entries for a thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn unresolved_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>>;

    /// Returns every ledger entry for a thread, resolved or not, oldest
    /// first. Used by thread export.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn all_contradictions_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>>;

    /// Appends an event record. Never mutated afterward.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_event(&self, event: &EventRecord) -> Result<()>;

    /// Returns all event records for a thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_events(&self, thread_id: &ThreadId) -> Result<Vec<EventRecord>>;
}
