//! In-memory repository for task tracking.
//!
//! Mirrors the `PostgreSQL` adapter: sequential identifiers starting at 1,
//! unique task titles, cascading task deletion, idempotent status updates
//! and deletes, and the same bound on storable status codes. A single lock
//! guards all state, so the parent check and the subtask insert are atomic.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        NewSubTask, NewTask, PersistedSubTaskData, PersistedTaskData, SubTask, SubTaskElement,
        SubTaskId, Task, TaskId, TaskStatus,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
pub struct InMemoryTaskRepository<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: BTreeMap<TaskId, Task>,
    sub_tasks: BTreeMap<SubTaskId, SubTask>,
    titles: HashMap<String, TaskId>,
    last_task_id: u64,
    last_sub_task_id: u64,
}

impl InMemoryTaskRepository<DefaultClock> {
    /// Creates an empty in-memory repository using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskRepository<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty repository that stamps records with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }

    fn read(
        &self,
        operation: &'static str,
    ) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(operation, std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(operation, std::io::Error::other(err.to_string()))
        })
    }
}

impl<C> Clone for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> fmt::Debug for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTaskRepository")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn sub_tasks_of(state: &InMemoryTaskState, task_id: TaskId) -> Vec<SubTask> {
    let mut found: Vec<SubTask> = state
        .sub_tasks
        .values()
        .filter(|sub_task| sub_task.task_id() == task_id)
        .cloned()
        .collect();
    found.sort_by_key(|sub_task| (sub_task.created_at(), sub_task.id()));
    found
}

#[async_trait]
impl<C> TaskRepository for InMemoryTaskRepository<C>
where
    C: Clock + Send + Sync,
{
    async fn create_task(&self, task: &NewTask) -> TaskRepositoryResult<TaskId> {
        TaskRepositoryError::ensure_storable("create_task", task.status())?;
        let mut state = self.write("create_task")?;
        let title = task.title().as_str();
        if state.titles.contains_key(title) {
            return Err(TaskRepositoryError::TitleAlreadyExists(title.to_owned()));
        }

        state.last_task_id += 1;
        let id = TaskId::new(state.last_task_id);
        let stored = Task::from_persisted(PersistedTaskData {
            id,
            title: task.title().clone(),
            description: task.description().to_owned(),
            status: task.status(),
            created_at: self.clock.utc(),
        });
        state.titles.insert(title.to_owned(), id);
        state.tasks.insert(id, stored);
        Ok(id)
    }

    async fn get_task(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let state = self.read("get_task")?;
        state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::TaskNotFound(id))
    }

    async fn get_task_with_sub_tasks(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let state = self.read("get_task_with_sub_tasks")?;
        let task = state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::TaskNotFound(id))?;
        let elements = sub_tasks_of(&state, id)
            .into_iter()
            .map(SubTaskElement::from)
            .collect();
        Ok(task.with_sub_tasks(elements))
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> TaskRepositoryResult<()> {
        TaskRepositoryError::ensure_storable("set_task_status", status)?;
        let mut state = self.write("set_task_status")?;
        if let Some(existing) = state.tasks.remove(&id) {
            state.tasks.insert(id, existing.with_status(status));
        }
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write("delete_task")?;
        if let Some(removed) = state.tasks.remove(&id) {
            state.titles.remove(removed.title().as_str());
            state.sub_tasks.retain(|_, sub_task| sub_task.task_id() != id);
        }
        Ok(())
    }

    async fn list_tasks(&self, status: Option<TaskStatus>) -> TaskRepositoryResult<Vec<Task>> {
        if status.is_some_and(|wanted| !wanted.is_storable()) {
            return Ok(Vec::new());
        }
        let state = self.read("list_tasks")?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| status.is_none_or(|wanted| task.status() == wanted))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.created_at(), task.id()));
        Ok(tasks)
    }

    async fn create_sub_task(&self, sub_task: &NewSubTask) -> TaskRepositoryResult<SubTask> {
        TaskRepositoryError::ensure_storable("create_sub_task", sub_task.status())?;
        let mut state = self.write("create_sub_task")?;
        let task_id = sub_task.task_id();
        if !state.tasks.contains_key(&task_id) {
            return Err(TaskRepositoryError::TaskNotFound(task_id));
        }

        state.last_sub_task_id += 1;
        let created = SubTask::from_persisted(PersistedSubTaskData {
            task_id,
            id: SubTaskId::new(state.last_sub_task_id),
            title: sub_task.title().clone(),
            description: sub_task.description().to_owned(),
            status: sub_task.status(),
            created_at: self.clock.utc(),
        });
        state.sub_tasks.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn list_sub_tasks(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<SubTask>> {
        let state = self.read("list_sub_tasks")?;
        Ok(sub_tasks_of(&state, task_id))
    }

    async fn set_sub_task_status(
        &self,
        id: SubTaskId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<()> {
        TaskRepositoryError::ensure_storable("set_sub_task_status", status)?;
        let mut state = self.write("set_sub_task_status")?;
        if let Some(existing) = state.sub_tasks.remove(&id) {
            state.sub_tasks.insert(id, existing.with_status(status));
        }
        Ok(())
    }

    async fn delete_sub_task(&self, id: SubTaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write("delete_sub_task")?;
        state.sub_tasks.remove(&id);
        Ok(())
    }
}
