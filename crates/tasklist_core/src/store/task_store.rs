//! Task snapshot persistence.
//!
//! # Responsibility
//! - Serialize the full task collection under one fixed key.
//! - Hydrate the collection at startup, tolerating absence and corruption.
//!
//! # Invariants
//! - `save` overwrites the previous snapshot as a whole.
//! - `load` never fails: missing or invalid data yields an empty collection.
//! - Logged fields are metadata only; titles and descriptions never reach logs.

use super::{KeyValueStore, StoreError, StoreResult};
use crate::model::task::Task;
use log::{error, info};
use std::collections::HashSet;
use std::time::Instant;

/// Result of a best-effort save, reported for observability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    Failed(StoreError),
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Durable store adapter for the task collection.
pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(kv: S, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Writes the full collection, absorbing any failure.
    ///
    /// # Side effects
    /// - Emits a `tasks_save` event; failures are logged at `error` and never
    ///   propagated.
    pub fn save(&self, tasks: &[Task]) -> PersistOutcome {
        let started_at = Instant::now();
        match self.try_save(tasks) {
            Ok(()) => {
                info!(
                    "event=tasks_save module=store status=ok key={} count={} duration_ms={}",
                    self.key,
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                PersistOutcome::Saved
            }
            Err(err) => {
                error!(
                    "event=tasks_save module=store status=error key={} count={} duration_ms={} error_code={} error={}",
                    self.key,
                    tasks.len(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                PersistOutcome::Failed(err)
            }
        }
    }

    /// Reads the stored collection, substituting an empty one on any problem.
    ///
    /// # Side effects
    /// - Emits a `tasks_load` event with `status=ok|empty|error`.
    pub fn load(&self) -> Vec<Task> {
        let started_at = Instant::now();
        match self.try_load() {
            Ok(Some(tasks)) => {
                info!(
                    "event=tasks_load module=store status=ok key={} count={} duration_ms={}",
                    self.key,
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                tasks
            }
            Ok(None) => {
                info!(
                    "event=tasks_load module=store status=empty key={} duration_ms={}",
                    self.key,
                    started_at.elapsed().as_millis()
                );
                Vec::new()
            }
            Err(err) => {
                error!(
                    "event=tasks_load module=store status=error key={} duration_ms={} error_code={} error={}",
                    self.key,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Vec::new()
            }
        }
    }

    /// Serializes and writes the collection.
    ///
    /// # Errors
    /// - `Write` when serialization or the underlying write fails.
    pub fn try_save(&self, tasks: &[Task]) -> StoreResult<()> {
        let payload =
            serde_json::to_string(tasks).map_err(|err| StoreError::Write(err.to_string()))?;
        self.kv.set_item(&self.key, &payload)
    }

    /// Reads and decodes the stored collection.
    ///
    /// Returns `Ok(None)` when no value exists under the key.
    ///
    /// # Errors
    /// - `Read` when the medium cannot be read.
    /// - `Corrupt` when the value is not a JSON array of tasks or repeats an id.
    pub fn try_load(&self) -> StoreResult<Option<Vec<Task>>> {
        let Some(payload) = self.kv.get_item(&self.key)? else {
            return Ok(None);
        };
        decode_snapshot(&payload).map(Some)
    }

    /// Removes the stored snapshot.
    pub fn clear(&self) -> StoreResult<()> {
        self.kv.remove_item(&self.key)
    }
}

fn decode_snapshot(payload: &str) -> StoreResult<Vec<Task>> {
    let tasks: Vec<Task> =
        serde_json::from_str(payload).map_err(|err| StoreError::Corrupt(err.to_string()))?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(StoreError::Corrupt(format!("duplicate task id {}", task.id)));
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::task::{Priority, Task, TaskDraft};
    use crate::store::{MemoryKeyValueStore, StoreError};

    fn sample_tasks() -> Vec<Task> {
        let mut done = Task::from_draft(2, TaskDraft::new("Call mom", "Sunday", Priority::High));
        done.toggle_completion();
        vec![
            Task::from_draft(1, TaskDraft::new("Buy milk", "2%", Priority::Low)),
            done,
        ]
    }

    #[test]
    fn load_of_missing_key_is_empty() {
        let store = TaskStore::new(MemoryKeyValueStore::new(), "tasks");
        assert_eq!(store.try_load().unwrap(), None);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let store = TaskStore::new(MemoryKeyValueStore::new(), "tasks");
        let tasks = sample_tasks();

        assert!(store.save(&tasks).is_saved());
        assert_eq!(store.load(), tasks);

        assert!(store.save(&[]).is_saved());
        assert_eq!(store.try_load().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn load_of_malformed_payload_is_empty() {
        let kv = MemoryKeyValueStore::new();
        kv.insert_raw("tasks", "{not json");
        let store = TaskStore::new(kv, "tasks");

        assert!(matches!(store.try_load(), Err(StoreError::Corrupt(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_rejects_wrong_shape_and_duplicate_ids() {
        let kv = MemoryKeyValueStore::new();
        let store = TaskStore::new(kv.clone(), "tasks");

        kv.insert_raw("tasks", r#"{"id":1}"#);
        assert!(store.load().is_empty());

        kv.insert_raw(
            "tasks",
            r#"[{"id":1,"title":"a","description":"b","priority":"Urgent","completed":false}]"#,
        );
        assert!(store.load().is_empty());

        kv.insert_raw(
            "tasks",
            r#"[{"id":1,"title":"a","description":"b","priority":"Low","completed":false},
                {"id":1,"title":"c","description":"d","priority":"High","completed":true}]"#,
        );
        let err = store.try_load().unwrap_err();
        assert_eq!(err, StoreError::Corrupt("duplicate task id 1".to_string()));
    }

    #[test]
    fn read_failure_is_absorbed_by_load() {
        let kv = MemoryKeyValueStore::new();
        let store = TaskStore::new(kv.clone(), "tasks");
        store.save(&sample_tasks());

        kv.fail_reads(true);
        assert!(matches!(store.try_load(), Err(StoreError::Read(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let kv = MemoryKeyValueStore::new();
        let store = TaskStore::new(kv.clone(), "tasks");
        kv.fail_writes(true);

        let outcome = store.save(&sample_tasks());
        assert!(!outcome.is_saved());
        assert_eq!(kv.raw("tasks"), None);
    }

    #[test]
    fn clear_removes_snapshot() {
        let store = TaskStore::new(MemoryKeyValueStore::new(), "tasks");
        store.save(&sample_tasks());
        store.clear().unwrap();
        assert!(store.load().is_empty());
    }
}
