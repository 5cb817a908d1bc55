//! JSON snapshot export for a single thread (§6 `thread.export`).

use crate::ledger::ContradictionLedger;
use crate::models::{ContradictionEntry, EventRecord, Memory, ThreadId};
use crate::storage::StorageBackend;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A full, self-contained snapshot of one thread: every memory, every
/// ledger entry (resolved or not), and every event record, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadExport {
    /// The thread this snapshot covers.
    pub thread_id: ThreadId,
    /// All memories for the thread, in storage order.
    pub memories: Vec<Memory>,
    /// All ledger entries for the thread, oldest first.
    pub contradictions: Vec<ContradictionEntry>,
    /// All event records for the thread, oldest first.
    pub events: Vec<EventRecord>,
}

impl ThreadExport {
    /// Builds a snapshot by reading every table for `thread_id` from the
    /// storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying read fails.
    pub fn build(backend: &Arc<dyn StorageBackend>, thread_id: &ThreadId) -> Result<Self> {
        let memories = backend.list_memories(thread_id)?;
        let ledger = ContradictionLedger::new(Arc::clone(backend));
        let contradictions = ledger.all_for_thread(thread_id)?;
        let events = backend.list_events(thread_id)?;

        Ok(Self {
            thread_id: thread_id.clone(),
            memories,
            contradictions,
            events,
        })
    }

    /// Serializes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (it does not, in practice,
    /// for this type, but the caller contract stays honest about it).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Storage {
            operation: "thread_export_serialize".to_string(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemoryLane, MemorySource, MemoryId};
    use crate::storage::SqliteStorage;

    #[test]
    fn export_includes_memories_and_serializes() {
        let backend: Arc<dyn StorageBackend> = Arc::new(SqliteStorage::in_memory().unwrap());
        let thread = ThreadId::new("t1");
        let memory = Memory {
            id: MemoryId::new(),
            thread_id: thread.clone(),
            text: "I work at Acme".to_string(),
            slot: Some("employer".to_string()),
            value: Some("acme".to_string()),
            lane: MemoryLane::Belief,
            source: MemorySource::User,
            vector: vec![1.0, 0.0],
            trust: 0.5,
            confidence: 0.8,
            created_at: 1000,
        };
        backend.put_memory(&memory).unwrap();

        let export = ThreadExport::build(&backend, &thread).unwrap();
        assert_eq!(export.memories.len(), 1);
        assert!(export.to_json().unwrap().contains("Acme"));
    }

    #[test]
    fn export_of_empty_thread_is_empty_but_valid() {
        let backend: Arc<dyn StorageBackend> = Arc::new(SqliteStorage::in_memory().unwrap());
        let thread = ThreadId::new("empty");
        let export = ThreadExport::build(&backend, &thread).unwrap();
        assert!(export.memories.is_empty());
        assert!(export.contradictions.is_empty());
        assert!(export.events.is_empty());
    }
}
