//! Port contracts for task tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

#[cfg(test)]
pub use repository::MockTaskRepository;
pub use repository::{
    StatusOutOfRange, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
