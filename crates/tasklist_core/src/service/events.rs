//! Change notifications for collection observers.

use crate::model::task::TaskId;

/// Emitted after the collection changes or a background save fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Added { id: TaskId },
    Edited { id: TaskId },
    Deleted { id: TaskId },
    Toggled { id: TaskId, completed: bool },
    /// A snapshot could not be written; in-memory state is unaffected.
    PersistFailed { message: String },
}
