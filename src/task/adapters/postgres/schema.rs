//! Diesel schema for task persistence.

diesel::table! {
    /// Top-level task records.
    tasks (task_id) {
        /// Store-generated task identifier.
        task_id -> Int8,
        /// Unique task title.
        title -> Text,
        /// Free-form description.
        description -> Text,
        /// Workflow-state code.
        status -> Int8,
        /// Creation timestamp, defaulted by the store.
        create_date -> Timestamptz,
    }
}

diesel::table! {
    /// Subtask records owned by a task.
    subtasks (sub_task_id) {
        /// Store-generated subtask identifier.
        sub_task_id -> Int8,
        /// Owning task identifier.
        task_id -> Int8,
        /// Subtask title.
        title -> Text,
        /// Free-form description.
        description -> Text,
        /// Workflow-state code.
        status -> Int8,
        /// Creation timestamp, defaulted by the store.
        create_date -> Timestamptz,
    }
}

diesel::joinable!(subtasks -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, subtasks);
