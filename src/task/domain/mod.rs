//! Domain model for task tracking.
//!
//! Tasks and subtasks are plain value shapes. Identifiers and creation
//! timestamps are assigned by the store, so callers build [`NewTask`] and
//! [`NewSubTask`] payloads and receive the persisted shapes back.

mod error;
mod ids;
mod sub_task;
mod task;

pub use error::TaskDomainError;
pub use ids::{SubTaskId, TaskId, TaskStatus, TaskTitle};
pub use sub_task::{NewSubTask, PersistedSubTaskData, SubTask, SubTaskElement};
pub use task::{NewTask, PersistedTaskData, Task};
