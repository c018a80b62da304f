//! `PostgreSQL` adapters for task persistence.

mod constraints;
mod models;
mod repository;
mod schema;

pub use constraints::{
    ConstraintKind, ConstraintMap, SUBTASK_PARENT_FOREIGN_KEY, TASK_TITLE_UNIQUE,
};
pub use repository::{PostgresTaskRepository, TaskPgPool};
