//! Task and subtask persistence for the task tracker.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! Deleting a task also deletes its subtasks. Listings are ordered by
//! creation time, then identifier.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
