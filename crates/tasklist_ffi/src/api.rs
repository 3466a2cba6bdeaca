//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task list actions and reads to Dart via FRB.
//! - Own the single `TaskManager` of the running app between calls.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Hydration runs at most once per session; repeated init calls with the
//!   same database path are no-ops.
//! - Task actions before `tasks_initialize` fail with `ok=false`.

use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tasklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_task_store,
    ping as ping_inner, CoreConfig, Priority, Task, TaskDraft, TaskManager,
};

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

struct Session {
    db_path: PathBuf,
    manager: TaskManager,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task row rendered by the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// `Low|Medium|High`.
    pub priority: String,
    pub completed: bool,
}

impl From<&Task> for TaskItem {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.as_str().to_string(),
            completed: task.completed,
        }
    }
}

/// Full ordered collection for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Whether the core is initialized; `items` is empty when `false`.
    pub ok: bool,
    pub items: Vec<TaskItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Result envelope for task actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the request was accepted.
    pub ok: bool,
    /// Task after the action; `None` for init/delete/no-op results.
    pub task: Option<TaskItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<TaskItem>) -> Self {
        Self {
            ok: true,
            task,
            message: message.into(),
        }
    }

    fn failure(call: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("event=ffi_call module=ffi status=error call={call} error={message}");
        Self {
            ok: false,
            task: None,
            message: format!("{call} failed: {message}"),
        }
    }
}

/// Opens the task database and hydrates the collection.
///
/// `db_path` is the SQLite file inside the app's documents directory.
///
/// # FFI contract
/// - Sync call; blocks until hydration finishes.
/// - Idempotent for the same `db_path`; a different path is rejected.
/// - Missing or corrupt stored tasks hydrate an empty list with `ok=true`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_initialize(db_path: String) -> TaskActionResponse {
    const CALL: &str = "tasks_initialize";
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return TaskActionResponse::failure(CALL, "db_path cannot be empty");
    }
    let db_path = PathBuf::from(trimmed);

    let mut session = lock_session();
    if let Some(active) = session.as_ref() {
        if active.db_path == db_path {
            return TaskActionResponse::success("Already initialized.", None);
        }
        return TaskActionResponse::failure(
            CALL,
            format!(
                "already initialized at `{}`; refusing to switch to `{}`",
                active.db_path.display(),
                db_path.display()
            ),
        );
    }

    let config = CoreConfig::default();
    let manager = match open_task_store(&db_path, &config)
        .and_then(|store| TaskManager::initialize(store, &config))
    {
        Ok(manager) => manager,
        Err(err) => return TaskActionResponse::failure(CALL, err.to_string()),
    };
    let message = format!("Loaded {} task(s).", manager.len());
    *session = Some(Session { db_path, manager });
    TaskActionResponse::success(message, None)
}

/// Returns the live ordered collection.
///
/// # FFI contract
/// - Sync call, memory-only.
/// - Returns `ok=false` with no items before initialization.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_list() -> TaskListResponse {
    let session = lock_session();
    match session.as_ref() {
        Some(active) => TaskListResponse {
            ok: true,
            items: active.manager.tasks().iter().map(TaskItem::from).collect(),
            message: format!("{} task(s).", active.manager.len()),
        },
        None => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: "tasks are not initialized".to_string(),
        },
    }
}

/// Creates a task from the add form.
///
/// # FFI contract
/// - Sync call; persistence happens in the background.
/// - Rejects blank title/description and unknown priority labels.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(title: String, description: String, priority: String) -> TaskActionResponse {
    const CALL: &str = "task_add";
    let draft = match parse_draft(title, description, &priority) {
        Ok(draft) => draft,
        Err(message) => return TaskActionResponse::failure(CALL, message),
    };
    with_manager(CALL, |manager| match manager.add(draft) {
        Ok(task) => TaskActionResponse::success("Task created.", Some(TaskItem::from(&task))),
        Err(err) => TaskActionResponse::failure(CALL, err.to_string()),
    })
}

/// Updates title, description and priority of an existing task.
///
/// # FFI contract
/// - Unknown `id` is a successful no-op with `task=None`.
/// - Rejects blank title/description and unknown priority labels.
#[flutter_rust_bridge::frb(sync)]
pub fn task_edit(
    id: i64,
    title: String,
    description: String,
    priority: String,
) -> TaskActionResponse {
    const CALL: &str = "task_edit";
    let draft = match parse_draft(title, description, &priority) {
        Ok(draft) => draft,
        Err(message) => return TaskActionResponse::failure(CALL, message),
    };
    with_manager(CALL, |manager| match manager.edit(id, draft) {
        Ok(Some(task)) => TaskActionResponse::success("Task updated.", Some(TaskItem::from(&task))),
        Ok(None) => TaskActionResponse::success("No task with that id.", None),
        Err(err) => TaskActionResponse::failure(CALL, err.to_string()),
    })
}

/// Deletes a task.
///
/// # FFI contract
/// - Unknown `id` is a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: i64) -> TaskActionResponse {
    with_manager("task_delete", |manager| {
        if manager.delete(id) {
            TaskActionResponse::success("Task deleted.", None)
        } else {
            TaskActionResponse::success("No task with that id.", None)
        }
    })
}

/// Flips completion of a task.
///
/// # FFI contract
/// - Unknown `id` is a successful no-op with `task=None`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_completion(id: i64) -> TaskActionResponse {
    with_manager("task_toggle_completion", |manager| {
        match manager.toggle_completion(id) {
            Some(_) => TaskActionResponse::success(
                "Task toggled.",
                manager.get(id).map(TaskItem::from),
            ),
            None => TaskActionResponse::success("No task with that id.", None),
        }
    })
}

/// Waits until every pending save has been written.
///
/// Intended for app pause/background lifecycle hooks.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_flush() -> TaskActionResponse {
    with_manager("tasks_flush", |manager| {
        manager.flush();
        TaskActionResponse::success("Flushed.", None)
    })
}

/// Drains pending saves and releases the session.
///
/// A later `tasks_initialize` hydrates again from storage.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_shutdown() -> TaskActionResponse {
    // The worker join runs after the session lock is released.
    match take_session() {
        Some(active) => {
            active.manager.shutdown();
            TaskActionResponse::success("Shut down.", None)
        }
        None => TaskActionResponse::success("Not initialized.", None),
    }
}

fn parse_draft(title: String, description: String, priority: &str) -> Result<TaskDraft, String> {
    let priority = Priority::parse(priority).ok_or_else(|| {
        format!("unsupported priority `{}`; expected Low|Medium|High", priority.trim())
    })?;
    Ok(TaskDraft::new(title, description, priority))
}

fn with_manager(
    call: &str,
    f: impl FnOnce(&mut TaskManager) -> TaskActionResponse,
) -> TaskActionResponse {
    let mut session = lock_session();
    match session.as_mut() {
        Some(active) => f(&mut active.manager),
        None => TaskActionResponse::failure(call, "tasks are not initialized"),
    }
}

fn take_session() -> Option<Session> {
    lock_session().take()
}

fn lock_session() -> MutexGuard<'static, Option<Session>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, parse_draft, ping, task_add, task_delete, task_edit,
        take_session, task_toggle_completion, tasks_flush, tasks_initialize, tasks_list,
        tasks_shutdown, SESSION,
    };
    use tasklist_core::Priority;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn parse_draft_accepts_known_priorities_only() {
        let draft = parse_draft("t".to_string(), "d".to_string(), "medium").unwrap();
        assert_eq!(draft.priority, Priority::Medium);

        let error = parse_draft("t".to_string(), "d".to_string(), "urgent").unwrap_err();
        assert!(error.contains("unsupported priority"));
    }

    // The session is process-wide, so the whole lifecycle runs in one test.
    #[test]
    fn task_session_lifecycle() {
        let before_init = task_add("a".to_string(), "b".to_string(), "Low".to_string());
        assert!(!before_init.ok);
        assert!(!tasks_list().ok);

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tasks.db").to_string_lossy().to_string();
        let other_path = dir.path().join("other.db").to_string_lossy().to_string();

        let init = tasks_initialize(db_path.clone());
        assert!(init.ok, "{}", init.message);
        assert!(tasks_initialize(db_path.clone()).ok);
        assert!(!tasks_initialize(other_path).ok);

        let created = task_add("Buy milk".to_string(), "2%".to_string(), "Low".to_string());
        assert!(created.ok, "{}", created.message);
        let item = created.task.expect("created task should be returned");
        assert!(!item.completed);
        assert_eq!(item.priority, "Low");

        let blank = task_add("  ".to_string(), "x".to_string(), "Low".to_string());
        assert!(!blank.ok);
        assert!(blank.message.contains("title is required"));

        let edited = task_edit(
            item.id,
            "Buy oat milk".to_string(),
            "1L".to_string(),
            "High".to_string(),
        );
        let edited_item = edited.task.expect("edit should return the task");
        assert_eq!(edited_item.title, "Buy oat milk");
        assert_eq!(edited_item.id, item.id);

        let missing = task_edit(-1, "x".to_string(), "y".to_string(), "Low".to_string());
        assert!(missing.ok);
        assert!(missing.task.is_none());

        let toggled = task_toggle_completion(item.id);
        assert!(toggled.task.expect("toggled task").completed);

        assert_eq!(tasks_list().items.len(), 1);
        assert!(tasks_flush().ok);
        assert!(tasks_shutdown().ok);

        let reopened = tasks_initialize(db_path);
        assert!(reopened.ok, "{}", reopened.message);
        let items = tasks_list().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Buy oat milk");
        assert!(items[0].completed);

        assert!(task_delete(item.id).ok);
        assert!(tasks_list().items.is_empty());

        let active = take_session().expect("session should be active");
        assert!(SESSION.try_lock().is_ok(), "session lock must be free during shutdown");
        assert!(!tasks_list().ok);
        active.manager.shutdown();
        assert_eq!(tasks_shutdown().message, "Not initialized.");
    }
}
