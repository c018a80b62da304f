//! Constraint-name classification for `PostgreSQL` integrity violations.
//!
//! The repository never inspects vendor error codes or message text. It asks
//! a [`ConstraintMap`] which domain rule a violated constraint enforces.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Name of the unique constraint on `tasks.title`.
pub const TASK_TITLE_UNIQUE: &str = "tasks_title_key";

/// Name of the foreign key from `subtasks.task_id` to `tasks.task_id`.
pub const SUBTASK_PARENT_FOREIGN_KEY: &str = "subtasks_task_id_fkey";

/// Domain rule enforced by a database constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Task titles are globally unique.
    TitleUnique,
    /// Subtasks must reference an existing task.
    ParentTaskForeignKey,
}

/// Maps constraint names to the domain rule they enforce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMap {
    entries: Vec<(String, ConstraintKind)>,
}

impl ConstraintMap {
    /// Creates a map with no known constraints.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a constraint name, replacing any previous entry for it.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, kind: ConstraintKind) -> Self {
        let constraint = name.into();
        self.entries.retain(|(existing, _)| *existing != constraint);
        self.entries.push((constraint, kind));
        self
    }

    /// Returns the rule registered for a constraint name.
    #[must_use]
    pub fn kind_of(&self, constraint_name: &str) -> Option<ConstraintKind> {
        self.entries
            .iter()
            .find(|(name, _)| name == constraint_name)
            .map(|(_, kind)| *kind)
    }

    /// Classifies a Diesel error as a known integrity violation.
    ///
    /// Returns `None` for anything other than a unique or foreign-key
    /// violation on a registered constraint.
    #[must_use]
    pub fn classify(&self, err: &DieselError) -> Option<ConstraintKind> {
        let DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            info,
        ) = err
        else {
            return None;
        };
        info.constraint_name().and_then(|name| self.kind_of(name))
    }
}

impl Default for ConstraintMap {
    fn default() -> Self {
        Self::empty()
            .with(TASK_TITLE_UNIQUE, ConstraintKind::TitleUnique)
            .with(
                SUBTASK_PARENT_FOREIGN_KEY,
                ConstraintKind::ParentTaskForeignKey,
            )
    }
}
