//! Behaviour every `TaskRepository` adapter must exhibit.
//!
//! Each check receives a fresh, empty repository and returns an error
//! describing the first violated expectation.

use std::collections::BTreeSet;
use std::sync::Arc;

use eyre::{Result, ensure, eyre};
use tasktracker::task::{
    domain::{NewSubTask, NewTask, SubTaskId, TaskId, TaskStatus, TaskTitle},
    ports::{TaskRepository, TaskRepositoryError},
};

fn title(value: &str) -> Result<TaskTitle> {
    TaskTitle::new(value).map_err(|err| eyre!("invalid test title: {err}"))
}

fn new_task(value: &str, status: u64) -> Result<NewTask> {
    Ok(NewTask::new(title(value)?)
        .with_description("d")
        .with_status(TaskStatus::new(status)))
}

/// A second task with the same title is rejected and the first is untouched.
pub async fn duplicate_title_is_rejected<R: TaskRepository>(repository: &R) -> Result<()> {
    let first = repository.create_task(&new_task("A", 1)?).await?;
    let duplicate = repository.create_task(&new_task("A", 2)?).await;

    ensure!(
        matches!(duplicate, Err(TaskRepositoryError::TitleAlreadyExists(ref t)) if t == "A"),
        "expected TitleAlreadyExists(\"A\"), got {duplicate:?}"
    );
    let stored = repository.get_task(first).await?;
    ensure!(stored.title().as_str() == "A", "title changed");
    ensure!(stored.description() == "d", "description changed");
    ensure!(stored.status() == TaskStatus::new(1), "status changed");
    ensure!(
        repository.list_tasks(None).await?.len() == 1,
        "duplicate insert left a row behind"
    );
    Ok(())
}

/// Created tasks read back with every submitted field.
pub async fn created_task_reads_back<R: TaskRepository>(repository: &R) -> Result<()> {
    let id = repository.create_task(&new_task("A", 1)?).await?;
    let task = repository.get_task(id).await?;

    ensure!(task.id() == id, "id mismatch");
    ensure!(task.title().as_str() == "A", "title mismatch");
    ensure!(task.description() == "d", "description mismatch");
    ensure!(task.status() == TaskStatus::new(1), "status mismatch");
    ensure!(task.sub_tasks().is_empty(), "plain get embedded subtasks");
    Ok(())
}

/// Reading an identifier that was never issued fails with `TaskNotFound`.
pub async fn unknown_task_is_not_found<R: TaskRepository>(repository: &R) -> Result<()> {
    let missing = TaskId::new(4_242);
    let result = repository.get_task(missing).await;
    ensure!(
        matches!(result, Err(TaskRepositoryError::TaskNotFound(id)) if id == missing),
        "expected TaskNotFound, got {result:?}"
    );

    let huge = TaskId::new(u64::MAX);
    let result = repository.get_task(huge).await;
    ensure!(
        matches!(result, Err(TaskRepositoryError::TaskNotFound(id)) if id == huge),
        "expected TaskNotFound for out-of-range id, got {result:?}"
    );
    Ok(())
}

/// Deleting is idempotent and a deleted task is no longer readable.
pub async fn delete_is_idempotent<R: TaskRepository>(repository: &R) -> Result<()> {
    let id = repository.create_task(&new_task("Doomed", 0)?).await?;

    repository.delete_task(id).await?;
    repository.delete_task(id).await?;
    repository.delete_task(TaskId::new(9_999)).await?;

    let result = repository.get_task(id).await;
    ensure!(result.is_err_and(|err| err.is_not_found()), "task survived delete");
    Ok(())
}

/// Status updates on absent rows succeed and touch nothing else.
pub async fn set_status_is_idempotent<R: TaskRepository>(repository: &R) -> Result<()> {
    let id = repository.create_task(&new_task("Tracked", 1)?).await?;
    let before = repository.get_task(id).await?;

    repository
        .set_task_status(TaskId::new(9_999), TaskStatus::new(7))
        .await?;
    repository.set_task_status(id, TaskStatus::new(3)).await?;
    repository.set_task_status(id, TaskStatus::new(3)).await?;

    let after = repository.get_task(id).await?;
    ensure!(after.status() == TaskStatus::new(3), "status not updated");
    ensure!(after.id() == before.id(), "id changed");
    ensure!(after.title() == before.title(), "title changed");
    ensure!(
        after.created_at() == before.created_at(),
        "creation time changed"
    );
    ensure!(
        repository.list_tasks(None).await?.len() == 1,
        "status update on an absent id created a row"
    );
    Ok(())
}

/// Status filters return exactly the matching subset, in creation order.
pub async fn list_filters_by_status<R: TaskRepository>(repository: &R) -> Result<()> {
    let mut open = BTreeSet::new();
    let mut closed = BTreeSet::new();
    for index in 0..6_u64 {
        let status = if index % 2 == 0 { 1 } else { 2 };
        let id = repository
            .create_task(&new_task(&format!("task {index}"), status)?)
            .await?;
        if status == 1 {
            open.insert(id);
        } else {
            closed.insert(id);
        }
    }

    let all = repository.list_tasks(None).await?;
    let listed_open = repository.list_tasks(Some(TaskStatus::new(1))).await?;
    let listed_closed = repository.list_tasks(Some(TaskStatus::new(2))).await?;
    let listed_none = repository.list_tasks(Some(TaskStatus::new(99))).await?;

    let ids = |tasks: &[tasktracker::task::domain::Task]| -> Vec<TaskId> {
        tasks.iter().map(tasktracker::task::domain::Task::id).collect()
    };
    ensure!(all.len() == 6, "expected 6 tasks, found {}", all.len());
    ensure!(listed_open.len() == open.len(), "duplicates in open listing");
    ensure!(listed_closed.len() == closed.len(), "duplicates in closed listing");
    ensure!(
        ids(&listed_open).into_iter().collect::<BTreeSet<_>>() == open,
        "open listing mismatch"
    );
    ensure!(
        ids(&listed_closed).into_iter().collect::<BTreeSet<_>>() == closed,
        "closed listing mismatch"
    );
    ensure!(listed_none.is_empty(), "unused status matched tasks");

    let mut ordered = ids(&all);
    ordered.sort();
    ensure!(ids(&all) == ordered, "listing is not in creation order");
    Ok(())
}

/// A subtask for a missing parent is rejected and leaves no row.
pub async fn sub_task_requires_parent<R: TaskRepository>(repository: &R) -> Result<()> {
    let missing = TaskId::new(777);
    let result = repository
        .create_sub_task(&NewSubTask::new(missing, title("orphan")?))
        .await;

    ensure!(
        matches!(result, Err(TaskRepositoryError::TaskNotFound(id)) if id == missing),
        "expected TaskNotFound, got {result:?}"
    );
    ensure!(
        repository.list_sub_tasks(missing).await?.is_empty(),
        "rejected subtask was stored"
    );
    Ok(())
}

/// Subtasks are stored under their parent and embedded on request.
pub async fn sub_tasks_embed_on_joined_read<R: TaskRepository>(repository: &R) -> Result<()> {
    let parent = repository.create_task(&new_task("Parent", 1)?).await?;
    let first = repository
        .create_sub_task(
            &NewSubTask::new(parent, title("step")?)
                .with_description("one")
                .with_status(TaskStatus::new(4)),
        )
        .await?;
    let second = repository
        .create_sub_task(&NewSubTask::new(parent, title("step")?))
        .await?;

    ensure!(first.task_id() == parent, "subtask parent mismatch");
    ensure!(first.description() == "one", "subtask description mismatch");
    ensure!(first.status() == TaskStatus::new(4), "subtask status mismatch");
    ensure!(first.id() != second.id(), "subtask ids collide");

    let plain = repository.get_task(parent).await?;
    ensure!(plain.sub_tasks().is_empty(), "plain get embedded subtasks");

    let joined = repository.get_task_with_sub_tasks(parent).await?;
    let embedded: Vec<SubTaskId> = joined.sub_tasks().iter().map(|s| s.id()).collect();
    ensure!(
        embedded == vec![first.id(), second.id()],
        "embedded subtasks mismatch: {embedded:?}"
    );

    let missing = repository.get_task_with_sub_tasks(TaskId::new(31_337)).await;
    ensure!(
        missing.is_err_and(|err| err.is_not_found()),
        "joined read of a missing task succeeded"
    );
    Ok(())
}

/// Subtask status updates and deletes are idempotent.
pub async fn sub_task_mutations_are_idempotent<R: TaskRepository>(repository: &R) -> Result<()> {
    let parent = repository.create_task(&new_task("Parent", 1)?).await?;
    let kept = repository
        .create_sub_task(&NewSubTask::new(parent, title("kept")?))
        .await?;
    let dropped = repository
        .create_sub_task(&NewSubTask::new(parent, title("dropped")?))
        .await?;

    repository
        .set_sub_task_status(kept.id(), TaskStatus::new(8))
        .await?;
    repository
        .set_sub_task_status(SubTaskId::new(9_999), TaskStatus::new(8))
        .await?;
    repository.delete_sub_task(dropped.id()).await?;
    repository.delete_sub_task(dropped.id()).await?;

    let remaining = repository.list_sub_tasks(parent).await?;
    ensure!(remaining.len() == 1, "expected one subtask left");
    let survivor = remaining
        .first()
        .ok_or_else(|| eyre!("expected a remaining subtask"))?;
    ensure!(survivor.id() == kept.id(), "wrong subtask deleted");
    ensure!(survivor.status() == TaskStatus::new(8), "subtask status not set");
    ensure!(survivor.title() == kept.title(), "subtask title changed");
    ensure!(
        survivor.created_at() == kept.created_at(),
        "subtask creation time changed"
    );
    Ok(())
}

/// Deleting a task removes its subtasks.
pub async fn delete_cascades_to_sub_tasks<R: TaskRepository>(repository: &R) -> Result<()> {
    let parent = repository.create_task(&new_task("Parent", 1)?).await?;
    let sibling = repository.create_task(&new_task("Sibling", 1)?).await?;
    repository
        .create_sub_task(&NewSubTask::new(parent, title("child")?))
        .await?;
    repository
        .create_sub_task(&NewSubTask::new(sibling, title("child")?))
        .await?;

    repository.delete_task(parent).await?;

    ensure!(
        repository.list_sub_tasks(parent).await?.is_empty(),
        "subtasks outlived their task"
    );
    ensure!(
        repository.list_sub_tasks(sibling).await?.len() == 1,
        "cascade removed an unrelated subtask"
    );
    Ok(())
}

/// Statuses above `i64::MAX` cannot be stored: writes fail with a
/// persistence error naming the operation and filters match nothing.
pub async fn oversized_status_is_rejected<R: TaskRepository>(repository: &R) -> Result<()> {
    let oversized = TaskStatus::new(u64::MAX);
    let id = repository.create_task(&new_task("Bounded", 0)?).await?;

    let created = repository
        .create_task(&new_task("Too big", 0)?.with_status(oversized))
        .await;
    ensure!(
        matches!(
            created,
            Err(TaskRepositoryError::Persistence {
                operation: "create_task",
                ..
            })
        ),
        "oversized status was stored on create: {created:?}"
    );

    let updated = repository.set_task_status(id, oversized).await;
    ensure!(
        matches!(
            updated,
            Err(TaskRepositoryError::Persistence {
                operation: "set_task_status",
                ..
            })
        ),
        "oversized status was accepted on update: {updated:?}"
    );

    let sub_task = repository
        .create_sub_task(&NewSubTask::new(id, title("step")?).with_status(oversized))
        .await;
    ensure!(
        matches!(
            sub_task,
            Err(TaskRepositoryError::Persistence {
                operation: "create_sub_task",
                ..
            })
        ),
        "oversized subtask status was stored: {sub_task:?}"
    );

    let unreachable = repository
        .create_sub_task(&NewSubTask::new(TaskId::new(u64::MAX), title("never")?))
        .await;
    ensure!(
        unreachable.is_err_and(|err| err.is_not_found()),
        "subtask for an unstorable parent id was accepted"
    );

    ensure!(
        repository.list_tasks(Some(oversized)).await?.is_empty(),
        "oversized status filter matched rows"
    );
    ensure!(
        repository.get_task(id).await?.status() == TaskStatus::new(0),
        "failed update changed the stored status"
    );
    ensure!(
        repository.list_tasks(None).await?.len() == 1,
        "a rejected write left a row behind"
    );
    ensure!(
        repository.list_sub_tasks(id).await?.is_empty(),
        "a rejected subtask was stored"
    );
    Ok(())
}

/// Concurrent subtask creation racing a parent delete leaves no orphans.
pub async fn concurrent_sub_task_creation_never_orphans<R>(repository: Arc<R>) -> Result<()>
where
    R: TaskRepository + 'static,
{
    let parent = repository.create_task(&new_task("Contested", 1)?).await?;
    let step = title("racer")?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = Arc::clone(&repository);
        let payload = NewSubTask::new(parent, step.clone());
        handles.push(tokio::spawn(async move { repo.create_sub_task(&payload).await }));
    }
    let deleter = {
        let repo = Arc::clone(&repository);
        tokio::spawn(async move { repo.delete_task(parent).await })
    };

    for handle in handles {
        match handle.await? {
            Ok(created) => ensure!(created.task_id() == parent, "wrong parent"),
            Err(TaskRepositoryError::TaskNotFound(id)) => {
                ensure!(id == parent, "wrong id in TaskNotFound");
            }
            Err(other) => return Err(eyre!("unexpected subtask error: {other}")),
        }
    }
    deleter.await??;

    ensure!(
        repository.get_task(parent).await.is_err_and(|err| err.is_not_found()),
        "parent survived delete"
    );
    ensure!(
        repository.list_sub_tasks(parent).await?.is_empty(),
        "a subtask references a deleted task"
    );
    Ok(())
}
