//! Subtask records and their read projection.

use super::{SubTaskId, TaskId, TaskStatus, TaskTitle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Work item owned by exactly one task.
///
/// Subtask titles are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    task_id: TaskId,
    id: SubTaskId,
    title: TaskTitle,
    description: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubTaskData {
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Store-assigned identifier.
    pub id: SubTaskId,
    /// Subtask title.
    pub title: TaskTitle,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: TaskStatus,
    /// Creation timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl SubTask {
    /// Reconstructs a subtask from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubTaskData) -> Self {
        Self {
            task_id: data.task_id,
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            created_at: data.created_at,
        }
    }

    /// Returns a copy carrying a new status. Identifiers, title and creation
    /// time are unchanged.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubTaskId {
        self.id
    }

    /// Returns the subtask title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the subtask description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the workflow-state code.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Subtask as embedded inside a [`super::Task`] read, without the owning
/// task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskElement {
    #[serde(rename = "sub_task_id")]
    id: SubTaskId,
    title: TaskTitle,
    description: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
}

impl SubTaskElement {
    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubTaskId {
        self.id
    }

    /// Returns the subtask title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the subtask description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the workflow-state code.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<SubTask> for SubTaskElement {
    fn from(sub_task: SubTask) -> Self {
        Self {
            id: sub_task.id,
            title: sub_task.title,
            description: sub_task.description,
            status: sub_task.status,
            created_at: sub_task.created_at,
        }
    }
}

/// Values supplied by callers when creating a subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubTask {
    task_id: TaskId,
    title: TaskTitle,
    description: String,
    status: TaskStatus,
}

impl NewSubTask {
    /// Creates a payload for the given parent task with an empty description
    /// and status `0`.
    #[must_use]
    pub fn new(task_id: TaskId, title: TaskTitle) -> Self {
        Self {
            task_id,
            title,
            description: String::new(),
            status: TaskStatus::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the initial workflow-state code.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the parent task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the requested title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the requested description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the requested status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }
}
