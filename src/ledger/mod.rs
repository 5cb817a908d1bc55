//! Contradiction Ledger (§4.D): an append-only record of every detected
//! relationship between successive facts on the same slot.

use crate::models::{ContradictionEntry, LedgerId, MemoryId, ResolutionMethod, RetrievedMemory, Status, ThreadId, Topology};
use crate::storage::StorageBackend;
use crate::Result;
use std::sync::Arc;

/// The ledger, backed by a [`StorageBackend`].
///
/// Integrity: `resolve` only ever updates `status`/`resolved_at`; the
/// topology and referenced memory ids of an entry never change once
/// written (invariant 4, P6).
pub struct ContradictionLedger {
    backend: Arc<dyn StorageBackend>,
}

impl ContradictionLedger {
    /// Wraps a storage backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Records a new, `OPEN` ledger entry and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        thread_id: ThreadId,
        old_id: MemoryId,
        new_id: MemoryId,
        topology: Topology,
        drift: f32,
        confidence_delta: f32,
        summary: impl Into<String>,
        now: u64,
    ) -> Result<LedgerId> {
        let entry = ContradictionEntry::new(thread_id, old_id, new_id, topology, drift, confidence_delta, summary, now);
        let ledger_id = entry.ledger_id.clone();
        self.backend.put_contradiction(&entry)?;
        Ok(ledger_id)
    }

    /// Returns true iff an `OPEN`/`CONFLICT` entry references `memory_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn has_open_conflict(&self, memory_id: &MemoryId) -> Result<bool> {
        self.backend.has_open_conflict(memory_id)
    }

    /// Returns all unresolved entries for a thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn unresolved_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>> {
        self.backend.unresolved_for_thread(thread_id)
    }

    /// Returns every entry for a thread, resolved or not, oldest first.
    /// Used by thread export.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn all_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>> {
        self.backend.all_contradictions_for_thread(thread_id)
    }

    /// Transitions an `OPEN` entry to a resolved status. Idempotent:
    /// resolving an already-resolved entry succeeds without changing it
    /// again.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn resolve(&self, ledger_id: &LedgerId, method: ResolutionMethod, now: u64) -> Result<()> {
        let status = match method {
            ResolutionMethod::UserClarification => Status::ResolvedByUser,
            ResolutionMethod::Recency => Status::ResolvedByRecency,
            ResolutionMethod::Superseded => Status::Superseded,
        };
        self.backend.resolve_contradiction(ledger_id, status, now)
    }

    /// Counts how many of the given retrieved memories participate in an
    /// open conflict; used by the disclosure engine's uncertainty check.
    #[must_use]
    pub fn overlaps(memories: &[RetrievedMemory]) -> usize {
        memories.iter().filter(|m| m.reintroduced_claim).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn ledger() -> ContradictionLedger {
        ContradictionLedger::new(Arc::new(SqliteStorage::in_memory().unwrap()))
    }

    #[test]
    fn record_then_has_open_conflict() {
        let ledger = ledger();
        let thread = ThreadId::new("t1");
        let old = MemoryId::new();
        let new = MemoryId::new();

        ledger
            .record(thread.clone(), old.clone(), new, Topology::Conflict, 0.8, -0.2, "conflict", 1000)
            .unwrap();

        assert!(ledger.has_open_conflict(&old).unwrap());
    }

    #[test]
    fn resolve_is_idempotent() {
        let ledger = ledger();
        let thread = ThreadId::new("t1");
        let old = MemoryId::new();
        let new = MemoryId::new();
        let ledger_id = ledger
            .record(thread.clone(), old.clone(), new, Topology::Conflict, 0.8, -0.2, "conflict", 1000)
            .unwrap();

        ledger.resolve(&ledger_id, ResolutionMethod::UserClarification, 2000).unwrap();
        ledger.resolve(&ledger_id, ResolutionMethod::UserClarification, 3000).unwrap();

        assert!(!ledger.has_open_conflict(&old).unwrap());
    }

    #[test]
    fn non_conflict_topology_does_not_count_as_open_conflict() {
        let ledger = ledger();
        let thread = ThreadId::new("t1");
        let old = MemoryId::new();
        let new = MemoryId::new();
        ledger
            .record(thread, old.clone(), new, Topology::Refinement, 0.2, 0.0, "refinement", 1000)
            .unwrap();

        assert!(!ledger.has_open_conflict(&old).unwrap());
    }
}
