//! Key-value medium contracts and implementations.
//!
//! # Responsibility
//! - Provide the string get/set/remove surface the task store persists through.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - `set_item` fully overwrites any previous value under the key.
//! - Implementations are `Send` so they can be owned by the persist worker.

use super::{StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Local durable string storage addressed by key.
pub trait KeyValueStore: Send + 'static {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str) -> StoreResult<()>;
}

/// SQLite-backed key-value store.
///
/// Owns its connection so the whole store can move onto the persist worker.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| StoreError::Read(err.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )
            .map(|_| ())
            .map_err(|err| StoreError::Write(err.to_string()))
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])
            .map(|_| ())
            .map_err(|err| StoreError::Write(err.to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: u64,
}

/// Process-local key-value store.
///
/// Clones share the same entries, so a test can keep one handle while the
/// persist worker owns another. Reads and writes can be forced to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `get_item` calls fail with `StoreError::Read`.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Makes subsequent `set_item`/`remove_item` calls fail with
    /// `StoreError::Write`.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    /// Returns the raw value stored under `key`, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Stores a raw value under `key`, bypassing failure injection.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.lock().entries.insert(key.to_string(), value.into());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StoreError::Read(format!("read of `{key}` rejected")));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Write(format!("write of `{key}` rejected")));
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Write(format!("remove of `{key}` rejected")));
        }
        state.entries.remove(key);
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
    use crate::store::StoreError;

    #[test]
    fn sqlite_set_item_overwrites_previous_value() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(store.get_item("tasks").unwrap(), None);

        store.set_item("tasks", "[1]").unwrap();
        store.set_item("tasks", "[2]").unwrap();
        assert_eq!(store.get_item("tasks").unwrap().as_deref(), Some("[2]"));

        let rows: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_remove_item_clears_value() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        store.set_item("tasks", "[]").unwrap();
        store.remove_item("tasks").unwrap();
        assert_eq!(store.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn memory_store_clones_share_entries_and_failure_flags() {
        let store = MemoryKeyValueStore::new();
        let handle = store.clone();

        store.set_item("k", "v").unwrap();
        assert_eq!(handle.raw("k").as_deref(), Some("v"));
        assert_eq!(handle.write_count(), 1);

        handle.fail_writes(true);
        assert!(matches!(store.set_item("k", "w"), Err(StoreError::Write(_))));
        handle.fail_reads(true);
        assert!(matches!(store.get_item("k"), Err(StoreError::Read(_))));
        assert_eq!(handle.raw("k").as_deref(), Some("v"));
    }
}
