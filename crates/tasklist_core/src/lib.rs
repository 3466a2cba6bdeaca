//! Core domain logic for the task list app.
//! This crate owns the task collection, its invariants and its persistence.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig, DEFAULT_STORAGE_KEY, MAX_EVENT_CAPACITY};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Priority, Task, TaskDraft, TaskId, TaskState, TaskValidationError};
pub use service::events::TaskEvent;
pub use service::task_manager::TaskManager;
pub use store::{
    open_task_store, CoreError, CoreResult, KeyValueStore, MemoryKeyValueStore, PersistOutcome,
    SqliteKeyValueStore, StoreError, StoreResult, TaskStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
