//! Service layer exposed to the external API boundary.
//!
//! Each operation validates its input and then delegates to the repository
//! unchanged. Error kinds raised by the repository pass through untouched so
//! the API layer can map them to transport responses.

use crate::task::{
    domain::{NewTask, Task, TaskDomainError, TaskId, TaskStatus, TaskTitle},
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    status: u64,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: 0,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the initial status code.
    #[must_use]
    pub const fn with_status(mut self, status: u64) -> Self {
        self.status = status;
        self
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> TaskService<R>
where
    R: TaskRepository,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Creates a task and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when the title is empty, or
    /// [`TaskServiceError::Repository`] when the title is taken or persistence
    /// fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskServiceResult<TaskId> {
        let title = TaskTitle::new(request.title)?;
        let task = NewTask::new(title)
            .with_description(request.description)
            .with_status(TaskStatus::new(request.status));
        Ok(self.repository.create_task(&task).await?)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the task does not exist
    /// or persistence fails.
    pub async fn get(&self, id: TaskId) -> TaskServiceResult<Task> {
        Ok(self.repository.get_task(id).await?)
    }

    /// Deletes a task and its subtasks. Deleting an absent task succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when persistence fails.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<()> {
        Ok(self.repository.delete_task(id).await?)
    }

    /// Lists tasks, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when persistence fails.
    pub async fn list(&self, status: Option<u64>) -> TaskServiceResult<Vec<Task>> {
        let filter = status.map(TaskStatus::new);
        Ok(self.repository.list_tasks(filter).await?)
    }

    /// Overwrites the status of a task. Absent tasks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when persistence fails.
    pub async fn set_status(&self, id: TaskId, status: u64) -> TaskServiceResult<()> {
        Ok(self
            .repository
            .set_task_status(id, TaskStatus::new(status))
            .await?)
    }
}
