//! Repository port for task and subtask persistence.
//!
//! Status updates and deletes are idempotent: they never check that the
//! target exists, and touching an absent row succeeds. Callers may therefore
//! retry them freely.

use crate::task::domain::{NewSubTask, NewTask, SubTask, SubTaskId, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Dropping a returned future cancels the operation from the caller's point
/// of view; implementations release any connection or transaction they hold
/// on every exit path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::TitleAlreadyExists`] when another task
    /// already uses the title, and [`TaskRepositoryError::Persistence`] when
    /// the status is not storable.
    async fn create_task(&self, task: &NewTask) -> TaskRepositoryResult<TaskId>;

    /// Reads one task by identifier, without subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::TaskNotFound`] when no task has the
    /// identifier.
    async fn get_task(&self, id: TaskId) -> TaskRepositoryResult<Task>;

    /// Reads one task by identifier with its subtasks embedded, ordered by
    /// creation time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::TaskNotFound`] when no task has the
    /// identifier.
    async fn get_task_with_sub_tasks(&self, id: TaskId) -> TaskRepositoryResult<Task>;

    /// Overwrites the status of a task. Absent tasks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the status is not
    /// storable or the store fails.
    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> TaskRepositoryResult<()>;

    /// Deletes a task and its subtasks. Absent tasks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the store fails.
    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Lists tasks ordered by creation time then identifier, optionally
    /// restricted to one status. A filter on a status that cannot be stored
    /// matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the store fails.
    async fn list_tasks(&self, status: Option<TaskStatus>) -> TaskRepositoryResult<Vec<Task>>;

    /// Stores a subtask under an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::TaskNotFound`] when the parent task does
    /// not exist, including when it disappears before the insert commits, and
    /// [`TaskRepositoryError::Persistence`] when the status is not storable.
    async fn create_sub_task(&self, sub_task: &NewSubTask) -> TaskRepositoryResult<SubTask>;

    /// Lists the subtasks of a task ordered by creation time then identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the store fails.
    async fn list_sub_tasks(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<SubTask>>;

    /// Overwrites the status of a subtask. Absent subtasks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the status is not
    /// storable or the store fails.
    async fn set_sub_task_status(
        &self,
        id: SubTaskId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<()>;

    /// Deletes a subtask. Absent subtasks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the store fails.
    async fn delete_sub_task(&self, id: SubTaskId) -> TaskRepositoryResult<()>;
}

/// A status code exceeds [`TaskStatus::MAX_STORABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("status {0} exceeds the storable range")]
pub struct StatusOutOfRange(pub TaskStatus);

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Another task already uses this title.
    #[error("task title already exists: {0}")]
    TitleAlreadyExists(String),

    /// Persistence-layer failure.
    #[error("persistence error during {operation}: {source}")]
    Persistence {
        /// Name of the repository operation that failed.
        operation: &'static str,
        /// Underlying cause.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl TaskRepositoryError {
    /// Wraps a persistence error raised while running `operation`.
    pub fn persistence(
        operation: &'static str,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            operation,
            source: Arc::new(err),
        }
    }

    /// Rejects a status that no store can hold.
    ///
    /// Every adapter applies this before touching its storage, so an
    /// oversized status fails the same way everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] wrapping
    /// [`StatusOutOfRange`] for `operation`.
    pub fn ensure_storable(
        operation: &'static str,
        status: TaskStatus,
    ) -> TaskRepositoryResult<()> {
        if status.is_storable() {
            Ok(())
        } else {
            Err(Self::persistence(operation, StatusOutOfRange(status)))
        }
    }

    /// Returns `true` for [`TaskRepositoryError::TaskNotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_))
    }

    /// Returns `true` for [`TaskRepositoryError::TitleAlreadyExists`].
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::TitleAlreadyExists(_))
    }
}
