//! Core configuration.
//!
//! # Responsibility
//! - Carry the tunables of the durable store and state manager.
//! - Reject unusable values before any storage is touched.
//!
//! # Invariants
//! - `storage_key` is never blank.
//! - `event_capacity` is between 1 and `MAX_EVENT_CAPACITY`.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key the task snapshot is written under.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";
/// Buffered change events per subscriber before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;
/// Upper bound for `event_capacity`; the event channel preallocates its slots.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Settings for one task core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Fixed key of the key-value entry holding the serialized tasks.
    pub storage_key: String,
    /// Capacity of the change event channel returned by `subscribe()`.
    pub event_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// # Errors
    /// - `EmptyStorageKey` when `storage_key` is blank.
    /// - `ZeroEventCapacity` when `event_capacity` is `0`.
    /// - `EventCapacityTooLarge` when `event_capacity` exceeds `MAX_EVENT_CAPACITY`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(ConfigError::EventCapacityTooLarge);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStorageKey,
    ZeroEventCapacity,
    EventCapacityTooLarge,
    /// The store handed to the manager writes under a different key.
    StorageKeyMismatch,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorageKey => write!(f, "storage_key cannot be empty"),
            Self::ZeroEventCapacity => write!(f, "event_capacity must be greater than zero"),
            Self::EventCapacityTooLarge => {
                write!(f, "event_capacity cannot exceed {MAX_EVENT_CAPACITY}")
            }
            Self::StorageKeyMismatch => {
                write!(f, "task store key does not match config storage_key")
            }
        }
    }
}

impl Error for ConfigError {}
