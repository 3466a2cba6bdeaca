//! Task state management.
//!
//! # Responsibility
//! - Own the in-memory task collection and the operations that mutate it.
//! - Mirror every mutation to the durable store off the caller's thread.
//!
//! # Invariants
//! - The in-memory collection is authoritative for the running session.
//! - Persistence failures never roll back an in-memory mutation.

pub mod events;
pub mod ids;
pub mod persist_queue;
pub mod task_manager;
