//! Durable store boundary.
//!
//! # Responsibility
//! - Define the key-value medium contract and its implementations.
//! - Persist and hydrate full task snapshots under one fixed key.
//!
//! # Invariants
//! - Storage failures never escape `TaskStore::save`/`TaskStore::load`; they
//!   are logged and recovered locally.
//! - Every write replaces the whole snapshot; there are no partial merges.

use crate::config::{ConfigError, CoreConfig};
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub mod kv;
pub mod task_store;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use task_store::{PersistOutcome, TaskStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure inside the durable store.
///
/// `Read` and `Corrupt` are recovered by hydrating an empty collection,
/// `Write` by keeping the unsynchronized in-memory state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The medium could not be read.
    Read(String),
    /// The medium rejected a write.
    Write(String),
    /// A stored value exists but is not a valid task snapshot.
    Corrupt(String),
}

impl StoreError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read(_) => "storage_read_failed",
            Self::Write(_) => "storage_write_failed",
            Self::Corrupt(_) => "storage_payload_corrupt",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(message) => write!(f, "storage read failed: {message}"),
            Self::Write(message) => write!(f, "storage write failed: {message}"),
            Self::Corrupt(message) => write!(f, "stored tasks are invalid: {message}"),
        }
    }
}

impl Error for StoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Setup failure while opening the durable store or starting the manager.
#[derive(Debug)]
pub enum CoreError {
    Db(DbError),
    Config(ConfigError),
    /// The persist worker thread could not be started.
    Spawn(std::io::Error),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "invalid config: {err}"),
            Self::Spawn(err) => write!(f, "failed to start persist worker: {err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Opens the SQLite-backed task store at `path` using `config.storage_key`.
///
/// # Errors
/// - `Config` when `config` fails validation.
/// - `Db` when the database cannot be opened or migrated.
pub fn open_task_store(
    path: impl AsRef<Path>,
    config: &CoreConfig,
) -> CoreResult<TaskStore<SqliteKeyValueStore>> {
    config.validate()?;
    let kv = SqliteKeyValueStore::open(path)?;
    Ok(TaskStore::new(kv, config.storage_key.clone()))
}
