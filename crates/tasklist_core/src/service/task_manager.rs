//! Task state manager.
//!
//! # Responsibility
//! - Hydrate the task collection from the durable store once at startup.
//! - Apply add/edit/delete/toggle requests to the in-memory collection.
//! - Enqueue a full snapshot save after every mutation.
//!
//! # Invariants
//! - Task IDs are unique within the collection, including after the ID
//!   generator is exhausted.
//! - Insertion order is preserved; edits and toggles never reorder.
//! - Requests for a missing ID are silent no-ops.
//! - Mutations return before their snapshot is written.
//! - A mutation's event is sent before its save is enqueued, so a
//!   `PersistFailed` always follows the event it belongs to.

use super::events::TaskEvent;
use super::ids::IdGenerator;
use super::persist_queue::PersistQueue;
use crate::config::{ConfigError, CoreConfig};
use crate::model::task::{Task, TaskDraft, TaskId, TaskValidationError};
use crate::store::{CoreError, CoreResult, KeyValueStore, TaskStore};
use log::{info, warn};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Owner of the live task collection.
///
/// Built by `initialize`, so hydration always happens exactly once and before
/// any mutation. Dropping the manager drains pending saves.
pub struct TaskManager {
    tasks: Vec<Task>,
    ids: IdGenerator,
    queue: PersistQueue,
    events: broadcast::Sender<TaskEvent>,
}

impl TaskManager {
    /// Hands `store` to the persist worker and hydrates from it.
    ///
    /// Blocks until the load finishes. Missing or corrupt stored data
    /// hydrates an empty collection.
    ///
    /// # Errors
    /// - `Config` when `config` fails validation, or when `store` writes under
    ///   a key other than `config.storage_key`.
    /// - `Spawn` when the persist worker cannot be started.
    pub fn initialize<S: KeyValueStore>(
        store: TaskStore<S>,
        config: &CoreConfig,
    ) -> CoreResult<Self> {
        config.validate()?;
        if store.key() != config.storage_key {
            return Err(ConfigError::StorageKeyMismatch.into());
        }
        let (events, _) = broadcast::channel(config.event_capacity);
        let queue = PersistQueue::spawn(store, events.clone()).map_err(CoreError::Spawn)?;

        let tasks = queue.load();
        let last_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        info!(
            "event=tasks_hydrate module=service status=ok count={}",
            tasks.len()
        );

        Ok(Self {
            tasks,
            ids: IdGenerator::seeded(last_id),
            queue,
            events,
        })
    }

    /// Live ordered collection.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Owned copy of the collection, for crossing thread or FFI boundaries.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Subscribes to change notifications.
    ///
    /// Slow subscribers lose the oldest events beyond `event_capacity`.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Appends a new incomplete task.
    ///
    /// # Errors
    /// - Returns the validation error for a blank title or description; the
    ///   collection is left unchanged.
    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, TaskValidationError> {
        draft.validate()?;
        let id = match self.ids.next_id() {
            Some(id) => id,
            None => self.free_id(),
        };
        let task = Task::from_draft(id, draft);
        self.tasks.push(task.clone());
        info!(
            "event=task_add module=service status=ok id={} priority={} count={}",
            task.id,
            task.priority,
            self.tasks.len()
        );
        self.notify(TaskEvent::Added { id: task.id });
        self.persist();
        Ok(task)
    }

    /// Replaces title, description and priority of the task with `id`.
    ///
    /// Returns `Ok(None)` without persisting when no task has `id`.
    ///
    /// # Errors
    /// - Returns the validation error for a blank title or description.
    pub fn edit(
        &mut self,
        id: TaskId,
        draft: TaskDraft,
    ) -> Result<Option<Task>, TaskValidationError> {
        draft.validate()?;
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            info!("event=task_edit module=service status=skipped reason=not_found id={id}");
            return Ok(None);
        };
        task.apply_draft(draft);
        let updated = task.clone();
        info!(
            "event=task_edit module=service status=ok id={} priority={}",
            id, updated.priority
        );
        self.notify(TaskEvent::Edited { id });
        self.persist();
        Ok(Some(updated))
    }

    /// Removes the task with `id` and returns whether one was removed.
    ///
    /// The snapshot is persisted even when nothing matched.
    pub fn delete(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        info!(
            "event=task_delete module=service status={} id={} count={}",
            if removed { "ok" } else { "skipped" },
            id,
            self.tasks.len()
        );
        if removed {
            self.notify(TaskEvent::Deleted { id });
        }
        self.persist();
        removed
    }

    /// Flips completion of the task with `id` and returns the new flag.
    ///
    /// Returns `None` without persisting when no task has `id`.
    pub fn toggle_completion(&mut self, id: TaskId) -> Option<bool> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            info!("event=task_toggle module=service status=skipped reason=not_found id={id}");
            return None;
        };
        let completed = task.toggle_completion();
        info!("event=task_toggle module=service status=ok id={id} completed={completed}");
        self.notify(TaskEvent::Toggled { id, completed });
        self.persist();
        Some(completed)
    }

    /// Blocks until every save enqueued so far has been written or failed.
    pub fn flush(&self) {
        self.queue.flush();
    }

    /// Drains pending saves and stops the persist worker.
    pub fn shutdown(mut self) {
        self.queue.shutdown();
        info!(
            "event=tasks_shutdown module=service status=ok count={}",
            self.tasks.len()
        );
    }

    /// Picks an ID not held by any task once the generator is exhausted.
    ///
    /// Prefers the ID just below the current minimum, then the smallest unused
    /// positive ID.
    fn free_id(&self) -> TaskId {
        let taken = self.tasks.iter().map(|task| task.id).collect::<HashSet<_>>();
        let below_min = taken
            .iter()
            .min()
            .and_then(|min| min.checked_sub(1))
            .filter(|candidate| *candidate > 0);
        let id = below_min.unwrap_or_else(|| {
            (1..=TaskId::MAX)
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or(0)
        });
        warn!(
            "event=task_add module=service status=fallback reason=id_exhausted id={id} count={}",
            self.tasks.len()
        );
        id
    }

    fn persist(&self) {
        self.queue.enqueue_save(self.tasks.clone());
    }

    fn notify(&self, event: TaskEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}
