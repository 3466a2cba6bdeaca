//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record rendered by the list and edit screens.
//! - Keep boundary validation next to the data it guards.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion removes a task entirely; there is no tombstone state.

pub mod task;
