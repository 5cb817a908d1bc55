//! `SQLite`-backed implementation of [`StorageBackend`].

use super::connection::{acquire_lock, configure_connection};
use super::{StorageBackend, TrustHistoryEntry};
use crate::models::{
    ContradictionEntry, EventId, EventKind, EventRecord, LedgerId, Memory, MemoryId, MemoryLane,
    MemorySource, Status, ThreadId, Topology,
};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// `SQLite`-backed storage for memories, contradictions, events, and trust
/// history.
///
/// # Concurrency model
///
/// A single `Mutex<Connection>` serializes writes; WAL mode and a busy
/// timeout (see [`configure_connection`]) keep concurrent readers from
/// blocking on them. This matches the engine's per-thread serialization
/// policy: callers are expected to serialize operations within one
/// `thread_id` themselves, so lock contention here is brief.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens (creating if needed) a database file and initializes its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::Storage {
            operation: "open".to_string(),
            cause: e.to_string(),
        })?;
        let storage = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        storage.initialize()?;
        Ok(storage)
    }

    /// Opens an in-memory database, useful for tests and ephemeral threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Storage {
            operation: "open_in_memory".to_string(),
            cause: e.to_string(),
        })?;
        let storage = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        storage.initialize()?;
        Ok(storage)
    }

    /// Returns the database file path, or `None` for an in-memory store.
    #[must_use]
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn);

        // New columns on these tables must be nullable with a default;
        // `contradictions.topology` and `memories.lane` are mandatory from v1.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS memories (
                memory_id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL,
                text TEXT NOT NULL,
                slot TEXT,
                value TEXT,
                lane TEXT NOT NULL,
                source TEXT NOT NULL,
                vector BLOB NOT NULL,
                trust REAL NOT NULL,
                confidence REAL NOT NULL,
                created_at INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_memories_thread ON memories(thread_id);
             CREATE INDEX IF NOT EXISTS idx_memories_thread_slot ON memories(thread_id, slot);

             CREATE TABLE IF NOT EXISTS contradictions (
                ledger_id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL,
                old_memory_id TEXT NOT NULL,
                new_memory_id TEXT NOT NULL,
                topology TEXT NOT NULL,
                status TEXT NOT NULL,
                drift REAL NOT NULL,
                confidence_delta REAL NOT NULL,
                summary TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                resolved_at INTEGER
             );
             CREATE INDEX IF NOT EXISTS idx_contradictions_thread ON contradictions(thread_id);
             CREATE INDEX IF NOT EXISTS idx_contradictions_memory ON contradictions(old_memory_id, new_memory_id);

             CREATE TABLE IF NOT EXISTS events (
                event_id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                timestamp INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_events_thread ON events(thread_id, timestamp);

             CREATE TABLE IF NOT EXISTS trust_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                memory_id TEXT NOT NULL,
                trust REAL NOT NULL,
                reason TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_trust_history_memory ON trust_history(memory_id);",
        )
        .map_err(|e| Error::Storage {
            operation: "initialize_schema".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn memory_from_row(row: &Row) -> rusqlite::Result<Memory> {
    let lane: String = row.get("lane")?;
    let source: String = row.get("source")?;
    let vector: Vec<u8> = row.get("vector")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(Memory {
        id: MemoryId::from(row.get::<_, String>("memory_id")?),
        thread_id: ThreadId::new(row.get::<_, String>("thread_id")?),
        text: row.get("text")?,
        slot: row.get("slot")?,
        value: row.get("value")?,
        lane: parse_lane(&lane),
        source: parse_source(&source),
        vector: decode_vector(&vector),
        trust: row.get("trust")?,
        confidence: row.get("confidence")?,
        created_at: created_at as u64,
    })
}

fn parse_lane(s: &str) -> MemoryLane {
    match s {
        "speech" => MemoryLane::Speech,
        _ => MemoryLane::Belief,
    }
}

fn parse_source(s: &str) -> MemorySource {
    match s {
        "system" => MemorySource::System,
        "doc" => MemorySource::Doc,
        "external" => MemorySource::External,
        _ => MemorySource::User,
    }
}

fn parse_topology(s: &str) -> Result<Topology> {
    match s {
        "REFINEMENT" => Ok(Topology::Refinement),
        "REVISION" => Ok(Topology::Revision),
        "TEMPORAL" => Ok(Topology::Temporal),
        "CONFLICT" => Ok(Topology::Conflict),
        other => Err(Error::Storage {
            operation: "parse_topology".to_string(),
            cause: format!("unrecognized topology in storage: {other}"),
        }),
    }
}

fn parse_status(s: &str) -> Result<Status> {
    match s {
        "OPEN" => Ok(Status::Open),
        "RESOLVED_BY_USER" => Ok(Status::ResolvedByUser),
        "RESOLVED_BY_RECENCY" => Ok(Status::ResolvedByRecency),
        "SUPERSEDED" => Ok(Status::Superseded),
        other => Err(Error::Storage {
            operation: "parse_status".to_string(),
            cause: format!("unrecognized status in storage: {other}"),
        }),
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn contradiction_from_row(row: &Row) -> rusqlite::Result<ContradictionEntry> {
    let topology: String = row.get("topology")?;
    let status: String = row.get("status")?;
    let created_at: i64 = row.get("created_at")?;
    let resolved_at: Option<i64> = row.get("resolved_at")?;

    let topology = parse_topology(&topology)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;
    let status = parse_status(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(ContradictionEntry {
        ledger_id: LedgerId::from(row.get::<_, String>("ledger_id")?),
        thread_id: ThreadId::new(row.get::<_, String>("thread_id")?),
        old_memory_id: MemoryId::from(row.get::<_, String>("old_memory_id")?),
        new_memory_id: MemoryId::from(row.get::<_, String>("new_memory_id")?),
        topology,
        status,
        drift: row.get("drift")?,
        confidence_delta: row.get("confidence_delta")?,
        summary: row.get("summary")?,
        created_at: created_at as u64,
        resolved_at: resolved_at.map(|t| t as u64),
    })
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn event_from_row(row: &Row) -> rusqlite::Result<EventRecord> {
    let kind: String = row.get("kind")?;
    let payload: String = row.get("payload")?;
    let timestamp: i64 = row.get("timestamp")?;

    Ok(EventRecord {
        event_id: EventId::from(row.get::<_, String>("event_id")?),
        thread_id: ThreadId::new(row.get::<_, String>("thread_id")?),
        kind: parse_event_kind(&kind),
        payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
        timestamp: timestamp as u64,
    })
}

fn parse_event_kind(s: &str) -> EventKind {
    match s {
        "CONTRADICTION" => EventKind::Contradiction,
        "RESOLUTION" => EventKind::Resolution,
        "RETRIEVAL" => EventKind::Retrieval,
        _ => EventKind::GateDecision,
    }
}

impl StorageBackend for SqliteStorage {
    fn put_memory(&self, memory: &Memory) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        #[allow(clippy::cast_possible_wrap)]
        let created_at = memory.created_at as i64;
        conn.execute(
            "INSERT OR REPLACE INTO memories
                (memory_id, thread_id, text, slot, value, lane, source, vector, trust, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                memory.id.as_str(),
                memory.thread_id.as_str(),
                memory.text,
                memory.slot,
                memory.value,
                memory.lane.to_string(),
                memory.source.to_string(),
                encode_vector(&memory.vector),
                memory.trust,
                memory.confidence,
                created_at,
            ],
        )
        .map_err(|e| Error::Storage {
            operation: "put_memory".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }

    fn get_memory(&self, id: &MemoryId) -> Result<Option<Memory>> {
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            "SELECT * FROM memories WHERE memory_id = ?1",
            params![id.as_str()],
            memory_from_row,
        )
        .optional()
        .map_err(|e| Error::Storage {
            operation: "get_memory".to_string(),
            cause: e.to_string(),
        })
    }

    fn list_memories(&self, thread_id: &ThreadId) -> Result<Vec<Memory>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT * FROM memories WHERE thread_id = ?1")
            .map_err(|e| Error::Storage {
                operation: "list_memories".to_string(),
                cause: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![thread_id.as_str()], memory_from_row)
            .map_err(|e| Error::Storage {
                operation: "list_memories".to_string(),
                cause: e.to_string(),
            })?;
        collect_rows(rows, "list_memories")
    }

    fn list_memories_by_slot(&self, thread_id: &ThreadId, slot: &str) -> Result<Vec<Memory>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT * FROM memories WHERE thread_id = ?1 AND slot = ?2 ORDER BY created_at DESC",
            )
            .map_err(|e| Error::Storage {
                operation: "list_memories_by_slot".to_string(),
                cause: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![thread_id.as_str(), slot], memory_from_row)
            .map_err(|e| Error::Storage {
                operation: "list_memories_by_slot".to_string(),
                cause: e.to_string(),
            })?;
        collect_rows(rows, "list_memories_by_slot")
    }

    fn set_trust(&self, memory_id: &MemoryId, trust: f32, reason: &str, now: u64) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        #[allow(clippy::cast_possible_wrap)]
        let now_i64 = now as i64;
        let tx = conn.transaction().map_err(|e| Error::Storage {
            operation: "set_trust_begin".to_string(),
            cause: e.to_string(),
        })?;

        let updated = tx
            .execute(
                "UPDATE memories SET trust = ?1 WHERE memory_id = ?2",
                params![trust, memory_id.as_str()],
            )
            .map_err(|e| Error::Storage {
                operation: "set_trust_update".to_string(),
                cause: e.to_string(),
            })?;
        if updated == 0 {
            return Err(Error::Storage {
                operation: "set_trust".to_string(),
                cause: format!("no such memory: {memory_id}"),
            });
        }

        tx.execute(
            "INSERT INTO trust_history (memory_id, trust, reason, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![memory_id.as_str(), trust, reason, now_i64],
        )
        .map_err(|e| Error::Storage {
            operation: "set_trust_history".to_string(),
            cause: e.to_string(),
        })?;

        tx.commit().map_err(|e| Error::Storage {
            operation: "set_trust_commit".to_string(),
            cause: e.to_string(),
        })
    }

    fn put_contradiction(&self, entry: &ContradictionEntry) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        #[allow(clippy::cast_possible_wrap)]
        let created_at = entry.created_at as i64;
        #[allow(clippy::cast_possible_wrap)]
        let resolved_at = entry.resolved_at.map(|t| t as i64);
        conn.execute(
            "INSERT INTO contradictions
                (ledger_id, thread_id, old_memory_id, new_memory_id, topology, status, drift, confidence_delta, summary, created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.ledger_id.as_str(),
                entry.thread_id.as_str(),
                entry.old_memory_id.as_str(),
                entry.new_memory_id.as_str(),
                entry.topology.as_str(),
                entry.status.to_string(),
                entry.drift,
                entry.confidence_delta,
                entry.summary,
                created_at,
                resolved_at,
            ],
        )
        .map_err(|e| Error::Storage {
            operation: "put_contradiction".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }

    fn resolve_contradiction(
        &self,
        ledger_id: &LedgerId,
        status: Status,
        resolved_at: u64,
    ) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        #[allow(clippy::cast_possible_wrap)]
        let resolved_at_i64 = resolved_at as i64;
        conn.execute(
            "UPDATE contradictions SET status = ?1, resolved_at = ?2 WHERE ledger_id = ?3",
            params![status.to_string(), resolved_at_i64, ledger_id.as_str()],
        )
        .map_err(|e| Error::Storage {
            operation: "resolve_contradiction".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }

    fn has_open_conflict(&self, memory_id: &MemoryId) -> Result<bool> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM contradictions
                 WHERE status = 'OPEN' AND topology = 'CONFLICT'
                   AND (old_memory_id = ?1 OR new_memory_id = ?1)",
                params![memory_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Storage {
                operation: "has_open_conflict".to_string(),
                cause: e.to_string(),
            })?;
        Ok(count > 0)
    }

    fn unresolved_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT * FROM contradictions WHERE thread_id = ?1 AND status = 'OPEN'")
            .map_err(|e| Error::Storage {
                operation: "unresolved_for_thread".to_string(),
                cause: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![thread_id.as_str()], contradiction_from_row)
            .map_err(|e| Error::Storage {
                operation: "unresolved_for_thread".to_string(),
                cause: e.to_string(),
            })?;
        collect_rows(rows, "unresolved_for_thread")
    }

    fn all_contradictions_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<ContradictionEntry>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT * FROM contradictions WHERE thread_id = ?1 ORDER BY created_at ASC")
            .map_err(|e| Error::Storage {
                operation: "all_contradictions_for_thread".to_string(),
                cause: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![thread_id.as_str()], contradiction_from_row)
            .map_err(|e| Error::Storage {
                operation: "all_contradictions_for_thread".to_string(),
                cause: e.to_string(),
            })?;
        collect_rows(rows, "all_contradictions_for_thread")
    }

    fn append_event(&self, event: &EventRecord) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        #[allow(clippy::cast_possible_wrap)]
        let timestamp = event.timestamp as i64;
        let payload = serde_json::to_string(&event.payload).map_err(|e| Error::Storage {
            operation: "append_event_serialize".to_string(),
            cause: e.to_string(),
        })?;
        conn.execute(
            "INSERT INTO events (event_id, thread_id, kind, payload, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_id.to_string(),
                event.thread_id.as_str(),
                event.kind.to_string(),
                payload,
                timestamp,
            ],
        )
        .map_err(|e| Error::Storage {
            operation: "append_event".to_string(),
            cause: e.to_string(),
        })?;
        Ok(())
    }

    fn list_events(&self, thread_id: &ThreadId) -> Result<Vec<EventRecord>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT * FROM events WHERE thread_id = ?1 ORDER BY timestamp ASC")
            .map_err(|e| Error::Storage {
                operation: "list_events".to_string(),
                cause: e.to_string(),
            })?;
        let rows = stmt
            .query_map(params![thread_id.as_str()], event_from_row)
            .map_err(|e| Error::Storage {
                operation: "list_events".to_string(),
                cause: e.to_string(),
            })?;
        collect_rows(rows, "list_events")
    }
}

fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row) -> rusqlite::Result<T>>,
    operation: &str,
) -> Result<Vec<T>> {
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(|e| Error::Storage {
            operation: operation.to_string(),
            cause: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Memory;

    fn storage() -> SqliteStorage {
        SqliteStorage::in_memory().expect("in-memory sqlite opens")
    }

    #[test]
    fn put_and_get_roundtrip() {
        let storage = storage();
        let thread = ThreadId::new("t1");
        let mem = Memory::new_user_fact(thread.clone(), "I work at Acme", "employer", "acme", 0.8, vec![0.1, 0.2, 0.3], 1000);
        storage.put_memory(&mem).unwrap();

        let fetched = storage.get_memory(&mem.id).unwrap().unwrap();
        assert_eq!(fetched.text, "I work at Acme");
        assert_eq!(fetched.vector, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn get_unknown_returns_none_not_error() {
        let storage = storage();
        let result = storage.get_memory(&MemoryId::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn set_trust_appends_history_row() {
        let storage = storage();
        let thread = ThreadId::new("t1");
        let mem = Memory::new_user_fact(thread, "x", "employer", "acme", 0.8, vec![], 1000);
        storage.put_memory(&mem).unwrap();

        storage.set_trust(&mem.id, 0.35, "CONFLICT", 2000).unwrap();
        let updated = storage.get_memory(&mem.id).unwrap().unwrap();
        assert!((updated.trust - 0.35).abs() < f32::EPSILON);
    }

    #[test]
    fn has_open_conflict_reflects_open_entries() {
        let storage = storage();
        let thread = ThreadId::new("t1");
        let old = MemoryId::new();
        let new = MemoryId::new();
        let entry = ContradictionEntry::new(thread, old.clone(), new, Topology::Conflict, 0.8, -0.1, "summary", 1000);
        storage.put_contradiction(&entry).unwrap();

        assert!(storage.has_open_conflict(&old).unwrap());
    }
}
