//! Diesel row models for task persistence.

use super::schema::{subtasks, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Store-generated task identifier.
    pub task_id: i64,
    /// Unique task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: i64,
    /// Creation timestamp.
    pub create_date: DateTime<Utc>,
}

/// Insert model for task records. `task_id` and `create_date` are assigned
/// by the store.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Unique task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: i64,
}

/// Query result row for subtask records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subtasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubTaskRow {
    /// Store-generated subtask identifier.
    pub sub_task_id: i64,
    /// Owning task identifier.
    pub task_id: i64,
    /// Subtask title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: i64,
    /// Creation timestamp.
    pub create_date: DateTime<Utc>,
}

/// Insert model for subtask records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subtasks)]
pub struct NewSubTaskRow {
    /// Owning task identifier.
    pub task_id: i64,
    /// Subtask title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow-state code.
    pub status: i64,
}
