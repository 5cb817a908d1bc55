//! Shared connection handling for the `SQLite` backend.

use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Acquires the connection mutex, recovering from poisoning instead of
/// propagating it.
///
/// A panic mid-transaction should not permanently wedge every later call on
/// this thread's connection; the connection itself is left in whatever
/// state `SQLite` rolled back to.
pub fn acquire_lock(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("storage connection mutex was poisoned, recovering");
            metrics::counter!("crt_storage_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        }
    }
}

/// Applies `SQLite` pragmas for durability under a single-writer mutex.
///
/// WAL mode lets readers proceed without blocking on the writer; the busy
/// timeout absorbs brief contention instead of surfacing `SQLITE_BUSY`.
pub fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
}
