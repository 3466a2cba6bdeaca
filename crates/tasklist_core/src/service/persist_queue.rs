//! Background persistence queue.
//!
//! # Responsibility
//! - Own the task store on a dedicated worker thread.
//! - Apply hydration loads and snapshot saves in submission order.
//!
//! # Invariants
//! - Commands are processed FIFO, so the last enqueued snapshot is the last
//!   one written.
//! - Save failures are logged and broadcast, never returned to the enqueuer.
//! - Dropping the queue drains outstanding saves before the worker exits.
//!
//! The blocking calls here (`load`, `flush`) must not run inside an async
//! runtime; callers are the synchronous FFI thread and tests.

use super::events::TaskEvent;
use crate::model::task::Task;
use crate::store::{KeyValueStore, PersistOutcome, TaskStore};
use log::{error, info, warn};
use std::io;
use std::thread::{self, JoinHandle};
use tokio::sync::{broadcast, mpsc, oneshot};

const WORKER_THREAD_NAME: &str = "tasklist-persist";

/// Work item for the persist worker.
#[derive(Debug)]
pub enum PersistCommand {
    Load { reply: oneshot::Sender<Vec<Task>> },
    Save { tasks: Vec<Task> },
    Flush { reply: oneshot::Sender<()> },
}

/// Handle to the persist worker.
pub struct PersistQueue {
    tx: Option<mpsc::UnboundedSender<PersistCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl PersistQueue {
    /// Moves `store` onto a new worker thread.
    ///
    /// # Errors
    /// - Returns the OS error when the worker thread cannot be spawned.
    pub fn spawn<S: KeyValueStore>(
        store: TaskStore<S>,
        events: broadcast::Sender<TaskEvent>,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(store, rx, events))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Loads the stored collection on the worker and waits for the result.
    ///
    /// Returns an empty collection if the worker is gone.
    pub fn load(&self) -> Vec<Task> {
        let (reply, reply_rx) = oneshot::channel();
        if !self.send(PersistCommand::Load { reply }) {
            return Vec::new();
        }
        reply_rx.blocking_recv().unwrap_or_else(|_| {
            error!("event=persist_worker module=service status=error error_code=load_reply_dropped");
            Vec::new()
        })
    }

    /// Enqueues a snapshot write without waiting for it.
    pub fn enqueue_save(&self, tasks: Vec<Task>) {
        self.send(PersistCommand::Save { tasks });
    }

    /// Blocks until every command enqueued before this call has been handled.
    pub fn flush(&self) {
        let (reply, reply_rx) = oneshot::channel();
        if self.send(PersistCommand::Flush { reply }) && reply_rx.blocking_recv().is_err() {
            error!("event=persist_worker module=service status=error error_code=flush_reply_dropped");
        }
    }

    /// Closes the queue and joins the worker after it drains.
    ///
    /// Idempotent.
    pub fn shutdown(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=persist_worker module=service status=error error_code=worker_panicked");
            }
        }
    }

    fn send(&self, command: PersistCommand) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            warn!("event=persist_worker module=service status=skipped reason=queue_closed");
            return false;
        };
        if tx.send(command).is_err() {
            error!("event=persist_worker module=service status=error error_code=worker_gone");
            return false;
        }
        true
    }
}

impl Drop for PersistQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<S: KeyValueStore>(
    store: TaskStore<S>,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
    events: broadcast::Sender<TaskEvent>,
) {
    info!(
        "event=persist_worker module=service status=start key={}",
        store.key()
    );
    let mut saved: u64 = 0;
    let mut failed: u64 = 0;

    while let Some(command) = rx.blocking_recv() {
        match command {
            PersistCommand::Load { reply } => {
                let _ = reply.send(store.load());
            }
            PersistCommand::Save { tasks } => match store.save(&tasks) {
                PersistOutcome::Saved => saved += 1,
                PersistOutcome::Failed(err) => {
                    failed += 1;
                    // No subscribers is fine; the failure is already logged.
                    let _ = events.send(TaskEvent::PersistFailed {
                        message: err.to_string(),
                    });
                }
            },
            PersistCommand::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }

    info!(
        "event=persist_worker module=service status=stop key={} saved={} failed={}",
        store.key(),
        saved,
        failed
    );
}

#[cfg(test)]
mod tests {
    use super::PersistQueue;
    use crate::model::task::{Priority, Task, TaskDraft};
    use crate::service::events::TaskEvent;
    use crate::store::{MemoryKeyValueStore, TaskStore};
    use tokio::sync::broadcast;

    fn task(id: i64) -> Task {
        Task::from_draft(id, TaskDraft::new(format!("t{id}"), "d", Priority::Low))
    }

    #[test]
    fn saves_are_written_in_submission_order() {
        let kv = MemoryKeyValueStore::new();
        let (events, _) = broadcast::channel(8);
        let queue = PersistQueue::spawn(TaskStore::new(kv.clone(), "tasks"), events).unwrap();

        let mut snapshot = Vec::new();
        for id in 1..=20 {
            snapshot.push(task(id));
            queue.enqueue_save(snapshot.clone());
        }
        queue.flush();

        assert_eq!(kv.write_count(), 20);
        let stored: Vec<Task> = serde_json::from_str(&kv.raw("tasks").unwrap()).unwrap();
        assert_eq!(stored, snapshot);
    }

    #[test]
    fn failed_save_is_broadcast() {
        let kv = MemoryKeyValueStore::new();
        kv.fail_writes(true);
        let (events, mut rx) = broadcast::channel(8);
        let queue = PersistQueue::spawn(TaskStore::new(kv, "tasks"), events).unwrap();

        queue.enqueue_save(vec![task(1)]);
        queue.flush();

        assert!(matches!(
            rx.try_recv(),
            Ok(TaskEvent::PersistFailed { .. })
        ));
    }

    #[test]
    fn shutdown_drains_pending_saves_and_is_idempotent() {
        let kv = MemoryKeyValueStore::new();
        let (events, _) = broadcast::channel(8);
        let mut queue = PersistQueue::spawn(TaskStore::new(kv.clone(), "tasks"), events).unwrap();

        queue.enqueue_save(vec![task(1), task(2)]);
        queue.shutdown();
        queue.shutdown();

        assert_eq!(kv.write_count(), 1);
        assert!(queue.load().is_empty());
        queue.enqueue_save(vec![task(3)]);
        assert_eq!(kv.write_count(), 1);
    }
}
