//! `PostgreSQL` repository implementation for task storage.

use super::{
    constraints::{ConstraintKind, ConstraintMap},
    models::{NewSubTaskRow, NewTaskRow, SubTaskRow, TaskRow},
    schema::{subtasks, tasks},
};
use crate::task::{
    domain::{
        NewSubTask, NewTask, PersistedSubTaskData, PersistedTaskData, SubTask, SubTaskElement,
        SubTaskId, Task, TaskId, TaskStatus, TaskTitle,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Every operation borrows one pooled connection on the blocking thread pool
/// and returns it when the closure finishes. Writes run inside a single
/// transaction which Diesel rolls back on any error, including when the
/// caller drops the operation's future before the commit.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
    constraints: Arc<ConstraintMap>,
}

/// A uniqueness invariant on `task_id` was observed to be broken.
#[derive(Debug, Error)]
#[error("more than one task row has id {0}")]
struct DuplicateTaskRow(TaskId);

/// The caller dropped the future before the work committed.
#[derive(Debug, Error)]
#[error("operation cancelled by caller")]
struct OperationCancelled;

/// Failure inside a blocking unit of work. Backend errors are tagged with
/// the operation name once the work returns.
#[derive(Debug)]
enum WorkError {
    Repository(TaskRepositoryError),
    Backend(DieselError),
}

impl From<DieselError> for WorkError {
    fn from(err: DieselError) -> Self {
        Self::Backend(err)
    }
}

impl From<TaskRepositoryError> for WorkError {
    fn from(err: TaskRepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl WorkError {
    fn into_repository(self, operation: &'static str) -> TaskRepositoryError {
        match self {
            Self::Repository(err) => err,
            Self::Backend(err) => TaskRepositoryError::persistence(operation, err),
        }
    }
}

type WorkResult<T> = Result<T, WorkError>;

/// Per-call context handed to a blocking unit of work.
struct Work<'a> {
    operation: &'static str,
    constraints: &'a ConstraintMap,
    cancel: &'a CancellationToken,
}

impl Work<'_> {
    /// Fails once the caller has gone away. Writes call this last inside
    /// their transaction so a cancelled call never commits.
    fn ensure_active(&self) -> WorkResult<()> {
        if self.cancel.is_cancelled() {
            debug!(operation = self.operation, "caller went away, rolling back");
            return Err(TaskRepositoryError::persistence(self.operation, OperationCancelled).into());
        }
        Ok(())
    }
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool using the
    /// default constraint names.
    #[must_use]
    pub fn new(pool: TaskPgPool) -> Self {
        Self::with_constraints(pool, ConstraintMap::default())
    }

    /// Creates a new repository with a custom constraint map, for schemas
    /// whose constraint names differ from the bundled migrations.
    #[must_use]
    pub fn with_constraints(pool: TaskPgPool, constraints: ConstraintMap) -> Self {
        Self {
            pool,
            constraints: Arc::new(constraints),
        }
    }

    async fn run_blocking<F, T>(&self, operation: &'static str, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection, &Work<'_>) -> WorkResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let constraints = Arc::clone(&self.constraints);
        let cancel = CancellationToken::new();
        // Dropping this future, or finishing it, cancels the token.
        let _cancel_on_drop = cancel.clone().drop_guard();
        tokio::task::spawn_blocking(move || {
            let work = Work {
                operation,
                constraints: &constraints,
                cancel: &cancel,
            };
            let mut connection = pool
                .get()
                .map_err(|err| TaskRepositoryError::persistence(operation, err))?;
            work.ensure_active()
                .and_then(|()| f(&mut connection, &work))
                .map_err(|err| err.into_repository(operation))
        })
        .await
        .map_err(|err| TaskRepositoryError::persistence(operation, err))?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create_task(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        let title = task.title().as_str().to_owned();
        let new_row = NewTaskRow {
            title: title.clone(),
            description: task.description().to_owned(),
            status: encode_status("create_task", task.status())?,
        };

        let raw_id = self
            .run_blocking("create_task", move |connection, work| {
                connection.transaction(|tx| {
                    let raw_id = diesel::insert_into(tasks::table)
                        .values(&new_row)
                        .returning(tasks::task_id)
                        .get_result::<i64>(tx)
                        .map_err(|err| match work.constraints.classify(&err) {
                            Some(ConstraintKind::TitleUnique) => {
                                warn!(title = %title, "task title already exists");
                                TaskRepositoryError::TitleAlreadyExists(title.clone()).into()
                            }
                            _ => WorkError::from(err),
                        })?;
                    work.ensure_active()?;
                    Ok(raw_id)
                })
            })
            .await?;

        let id = TaskId::new(decode("create_task", raw_id)?);
        debug!(task_id = %id, "task created");
        Ok(id)
    }

    async fn get_task(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let Some(key) = to_key(id.value()) else {
            return Err(TaskRepositoryError::TaskNotFound(id));
        };
        self.run_blocking("get_task", move |connection, work| {
            load_single_task(connection, id, key, work.operation)
        })
        .await
    }

    async fn get_task_with_sub_tasks(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let Some(key) = to_key(id.value()) else {
            return Err(TaskRepositoryError::TaskNotFound(id));
        };
        self.run_blocking("get_task_with_sub_tasks", move |connection, work| {
            connection
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run(|tx| {
                    let task = load_single_task(tx, id, key, work.operation)?;
                    let sub_tasks = load_sub_tasks(tx, key, work.operation)?
                        .into_iter()
                        .map(SubTaskElement::from)
                        .collect();
                    Ok(task.with_sub_tasks(sub_tasks))
                })
        })
        .await
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> TaskRepositoryResult<()> {
        let status_value = encode_status("set_task_status", status)?;
        let Some(key) = to_key(id.value()) else {
            return Ok(());
        };
        let updated = self
            .run_blocking("set_task_status", move |connection, work| {
                connection.transaction(|tx| {
                    let updated = diesel::update(tasks::table.filter(tasks::task_id.eq(key)))
                        .set(tasks::status.eq(status_value))
                        .execute(tx)?;
                    work.ensure_active()?;
                    Ok(updated)
                })
            })
            .await?;
        debug!(task_id = %id, %status, updated, "task status set");
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let Some(key) = to_key(id.value()) else {
            return Ok(());
        };
        let removed_sub_tasks = self
            .run_blocking("delete_task", move |connection, work| {
                connection.transaction(|tx| {
                    // Locking the parent blocks concurrent subtask inserts
                    // until the cascade below commits.
                    let locked = tasks::table
                        .filter(tasks::task_id.eq(key))
                        .select(tasks::task_id)
                        .for_update()
                        .load::<i64>(tx)?;
                    if locked.is_empty() {
                        return Ok(0);
                    }

                    let removed = diesel::delete(subtasks::table.filter(subtasks::task_id.eq(key)))
                        .execute(tx)?;
                    diesel::delete(tasks::table.filter(tasks::task_id.eq(key))).execute(tx)?;
                    work.ensure_active()?;
                    Ok(removed)
                })
            })
            .await?;
        debug!(task_id = %id, removed_sub_tasks, "task deleted");
        Ok(())
    }

    async fn list_tasks(&self, status: Option<TaskStatus>) -> TaskRepositoryResult<Vec<Task>> {
        let status_filter = match status {
            Some(requested) => match to_key(requested.value()) {
                Some(value) => Some(value),
                // No stored row can carry a status outside the column range.
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        self.run_blocking("list_tasks", move |connection, work| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .order((tasks::create_date.asc(), tasks::task_id.asc()))
                .into_boxed();
            if let Some(value) = status_filter {
                query = query.filter(tasks::status.eq(value));
            }
            let rows = query.load::<TaskRow>(connection)?;
            let listed = rows
                .into_iter()
                .map(|row| row_to_task(row, work.operation))
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            Ok(listed)
        })
        .await
    }

    async fn create_sub_task(&self, sub_task: &NewSubTask) -> TaskRepositoryResult<SubTask> {
        let task_id = sub_task.task_id();
        let status = encode_status("create_sub_task", sub_task.status())?;
        let Some(parent_key) = to_key(task_id.value()) else {
            return Err(TaskRepositoryError::TaskNotFound(task_id));
        };
        let new_row = NewSubTaskRow {
            task_id: parent_key,
            title: sub_task.title().as_str().to_owned(),
            description: sub_task.description().to_owned(),
            status,
        };

        let created = self
            .run_blocking("create_sub_task", move |connection, work| {
                connection.transaction(|tx| {
                    // FOR KEY SHARE keeps the parent row alive until commit.
                    let parent = tasks::table
                        .filter(tasks::task_id.eq(parent_key))
                        .select(tasks::task_id)
                        .for_key_share()
                        .load::<i64>(tx)?;
                    if parent.is_empty() {
                        return Err(TaskRepositoryError::TaskNotFound(task_id).into());
                    }

                    let row = diesel::insert_into(subtasks::table)
                        .values(&new_row)
                        .returning(SubTaskRow::as_returning())
                        .get_result::<SubTaskRow>(tx)
                        .map_err(|err| match work.constraints.classify(&err) {
                            Some(ConstraintKind::ParentTaskForeignKey) => {
                                TaskRepositoryError::TaskNotFound(task_id).into()
                            }
                            _ => WorkError::from(err),
                        })?;
                    let created = row_to_sub_task(row, work.operation)?;
                    work.ensure_active()?;
                    Ok(created)
                })
            })
            .await
            .inspect_err(|err| {
                if err.is_not_found() {
                    warn!(task_id = %task_id, "subtask rejected, parent task missing");
                }
            })?;

        debug!(task_id = %task_id, sub_task_id = %created.id(), "subtask created");
        Ok(created)
    }

    async fn list_sub_tasks(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<SubTask>> {
        let Some(key) = to_key(task_id.value()) else {
            return Ok(Vec::new());
        };
        self.run_blocking("list_sub_tasks", move |connection, work| {
            load_sub_tasks(connection, key, work.operation)
        })
        .await
    }

    async fn set_sub_task_status(
        &self,
        id: SubTaskId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<()> {
        let status_value = encode_status("set_sub_task_status", status)?;
        let Some(key) = to_key(id.value()) else {
            return Ok(());
        };
        let updated = self
            .run_blocking("set_sub_task_status", move |connection, work| {
                connection.transaction(|tx| {
                    let target = subtasks::table.filter(subtasks::sub_task_id.eq(key));
                    let updated = diesel::update(target)
                        .set(subtasks::status.eq(status_value))
                        .execute(tx)?;
                    work.ensure_active()?;
                    Ok(updated)
                })
            })
            .await?;
        debug!(sub_task_id = %id, %status, updated, "subtask status set");
        Ok(())
    }

    async fn delete_sub_task(&self, id: SubTaskId) -> TaskRepositoryResult<()> {
        let Some(key) = to_key(id.value()) else {
            return Ok(());
        };
        let deleted = self
            .run_blocking("delete_sub_task", move |connection, work| {
                connection.transaction(|tx| {
                    let deleted =
                        diesel::delete(subtasks::table.filter(subtasks::sub_task_id.eq(key)))
                            .execute(tx)?;
                    work.ensure_active()?;
                    Ok(deleted)
                })
            })
            .await?;
        debug!(sub_task_id = %id, deleted, "subtask deleted");
        Ok(())
    }
}

fn load_single_task(
    connection: &mut PgConnection,
    id: TaskId,
    key: i64,
    operation: &'static str,
) -> WorkResult<Task> {
    let rows = tasks::table
        .filter(tasks::task_id.eq(key))
        .select(TaskRow::as_select())
        .limit(2)
        .load::<TaskRow>(connection)?;

    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (None, _) => Err(TaskRepositoryError::TaskNotFound(id).into()),
        (Some(row), None) => Ok(row_to_task(row, operation)?),
        (Some(_), Some(_)) => {
            error!(task_id = %id, operation, "task id is not unique");
            Err(TaskRepositoryError::persistence(operation, DuplicateTaskRow(id)).into())
        }
    }
}

fn load_sub_tasks(
    connection: &mut PgConnection,
    task_key: i64,
    operation: &'static str,
) -> WorkResult<Vec<SubTask>> {
    let rows = subtasks::table
        .filter(subtasks::task_id.eq(task_key))
        .select(SubTaskRow::as_select())
        .order((subtasks::create_date.asc(), subtasks::sub_task_id.asc()))
        .load::<SubTaskRow>(connection)?;
    let loaded = rows
        .into_iter()
        .map(|row| row_to_sub_task(row, operation))
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    Ok(loaded)
}

fn row_to_task(row: TaskRow, operation: &'static str) -> TaskRepositoryResult<Task> {
    let TaskRow {
        task_id,
        title,
        description,
        status,
        create_date,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::new(decode(operation, task_id)?),
        title: decode_title(operation, title)?,
        description,
        status: TaskStatus::new(decode(operation, status)?),
        created_at: create_date,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_sub_task(row: SubTaskRow, operation: &'static str) -> TaskRepositoryResult<SubTask> {
    let SubTaskRow {
        sub_task_id,
        task_id,
        title,
        description,
        status,
        create_date,
    } = row;

    let data = PersistedSubTaskData {
        task_id: TaskId::new(decode(operation, task_id)?),
        id: SubTaskId::new(decode(operation, sub_task_id)?),
        title: decode_title(operation, title)?,
        description,
        status: TaskStatus::new(decode(operation, status)?),
        created_at: create_date,
    };
    Ok(SubTask::from_persisted(data))
}

/// Converts a domain identifier to a column value. Values above `i64::MAX`
/// cannot be stored, so no row can match them.
fn to_key(value: u64) -> Option<i64> {
    i64::try_from(value).ok()
}

fn encode_status(operation: &'static str, status: TaskStatus) -> TaskRepositoryResult<i64> {
    TaskRepositoryError::ensure_storable(operation, status)?;
    i64::try_from(status.value()).map_err(|err| TaskRepositoryError::persistence(operation, err))
}

fn decode(operation: &'static str, value: i64) -> TaskRepositoryResult<u64> {
    u64::try_from(value).map_err(|err| TaskRepositoryError::persistence(operation, err))
}

fn decode_title(operation: &'static str, title: String) -> TaskRepositoryResult<TaskTitle> {
    TaskTitle::from_stored(title).map_err(|err| TaskRepositoryError::persistence(operation, err))
}
