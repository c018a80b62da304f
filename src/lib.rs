//! Tasktracker: transactional persistence for tasks and subtasks.
//!
//! This crate stores tasks and their subtasks in `PostgreSQL` and exposes
//! create, read, status-update, delete, and list operations with typed error
//! kinds that callers can match on.
//!
//! # Architecture
//!
//! Tasktracker follows hexagonal architecture principles:
//!
//! - **Domain**: Pure data contracts with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Entity model, repository port, adapters, and the task service
//! - [`config`]: Environment-driven store configuration and pool construction

pub mod config;
pub mod task;
