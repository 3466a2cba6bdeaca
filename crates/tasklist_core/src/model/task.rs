//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted task record and its priority/state projections.
//! - Validate user-provided drafts before they reach the collection.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `completed` starts as `false` for every newly created task.
//! - Serialized field names match the persisted payload layout exactly.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of a task.
///
/// Issued from epoch milliseconds at creation, bumped when the clock has not
/// advanced, so it is also monotonically increasing within one collection.
pub type TaskId = i64;

/// User-selected importance of a task.
///
/// Serialized as `"Low" | "Medium" | "High"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Returns the persisted label for this priority.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parses a priority label, case-insensitively and ignoring surrounding
    /// whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion state of a task.
///
/// A task moves between these two states only through a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Incomplete,
    Complete,
}

/// Canonical to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
}

impl Task {
    /// Builds an incomplete task from a draft with a caller-provided ID.
    ///
    /// This constructor does not validate the draft; the state manager calls
    /// `TaskDraft::validate()` first.
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            completed: false,
        }
    }

    /// Overwrites the editable fields, leaving `id` and `completed` untouched.
    pub fn apply_draft(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.priority = draft.priority;
    }

    /// Flips completion and returns the new flag.
    pub fn toggle_completion(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Complete
        } else {
            TaskState::Incomplete
        }
    }
}

/// Editable fields submitted by the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
        }
    }

    /// Rejects blank title or description.
    ///
    /// Text is stored as typed; only the emptiness check trims.
    ///
    /// # Errors
    /// - `EmptyTitle` when `title` is empty or whitespace-only.
    /// - `EmptyDescription` when `description` is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// Draft rejected at the core boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::EmptyDescription => write!(f, "description is required"),
        }
    }
}

impl Error for TaskValidationError {}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskDraft, TaskState, TaskValidationError};

    #[test]
    fn priority_defaults_to_low() {
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
        assert_eq!(Priority::parse("medium"), Some(Priority::Medium));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn task_serializes_with_persisted_field_names() {
        let task = Task::from_draft(7, TaskDraft::new("Buy milk", "2%", Priority::Medium));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "Buy milk",
                "description": "2%",
                "priority": "Medium",
                "completed": false
            })
        );
    }

    #[test]
    fn apply_draft_keeps_id_and_completion() {
        let mut task = Task::from_draft(1, TaskDraft::new("a", "b", Priority::Low));
        task.toggle_completion();
        task.apply_draft(TaskDraft::new("c", "d", Priority::High));

        assert_eq!(task.id, 1);
        assert!(task.completed);
        assert_eq!(task.title, "c");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn toggle_moves_between_states() {
        let mut task = Task::from_draft(1, TaskDraft::new("a", "b", Priority::Low));
        assert_eq!(task.state(), TaskState::Incomplete);
        assert!(task.toggle_completion());
        assert_eq!(task.state(), TaskState::Complete);
        assert!(!task.toggle_completion());
        assert_eq!(task.state(), TaskState::Incomplete);
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let blank_title = TaskDraft::new("   ", "desc", Priority::Low);
        assert_eq!(blank_title.validate(), Err(TaskValidationError::EmptyTitle));

        let blank_description = TaskDraft::new("title", "\n", Priority::Low);
        assert_eq!(
            blank_description.validate(),
            Err(TaskValidationError::EmptyDescription)
        );

        assert!(TaskDraft::new("title", "desc", Priority::High)
            .validate()
            .is_ok());
    }
}
