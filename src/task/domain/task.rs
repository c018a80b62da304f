//! Task aggregate and its creation payload.

use super::{SubTaskElement, TaskId, TaskStatus, TaskTitle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level trackable work item.
///
/// The wire representation uses `id` and `created_at`; the relational
/// representation uses `task_id` and `create_date`. Embedded subtasks are only
/// populated by reads that explicitly join them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    sub_tasks: Vec<SubTaskElement>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Unique task title.
    pub title: TaskTitle,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: TaskStatus,
    /// Creation timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage without subtasks.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            created_at: data.created_at,
            sub_tasks: Vec::new(),
        }
    }

    /// Attaches the subtasks read alongside this task.
    #[must_use]
    pub fn with_sub_tasks(mut self, sub_tasks: Vec<SubTaskElement>) -> Self {
        self.sub_tasks = sub_tasks;
        self
    }

    /// Returns a copy carrying a new status. Identifier, title and creation
    /// time are unchanged.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description.
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

    /// Returns the embedded subtasks, empty unless explicitly joined.
    #[must_use]
    pub fn sub_tasks(&self) -> &[SubTaskElement] {
        &self.sub_tasks
    }
}

/// Values supplied by callers when creating a task.
///
/// The identifier and creation timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: TaskTitle,
    description: String,
    status: TaskStatus,
}

impl NewTask {
    /// Creates a payload with an empty description and status `0`.
    #[must_use]
    pub fn new(title: TaskTitle) -> Self {
        Self {
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
