use time::OffsetDateTime;
use tracing::info;

use crate::{
    auth::Identity,
    error::AppError,
    tasks::{
        dto::CreateTaskRequest,
        guard::{self, Action},
        repo::TaskRepository,
        repo_types::{NewTask, TaskPatch, TaskReminder},
    },
};

pub async fn create_task(
    repo: &dyn TaskRepository,
    identity: &Identity,
    req: CreateTaskRequest,
) -> Result<TaskReminder, AppError> {
    guard::check_claimed_user(
        identity,
        req.created_by.as_deref(),
        "Cannot create a task for another user.",
    )?;

    let new_task = NewTask {
        time_to_run: req.time_to_run,
        assignee: req.assignee,
        task_content: req.task_content,
        reminder_type: req.reminder_type,
        created_by: identity.username().to_owned(),
    };
    let task = repo.create(new_task, OffsetDateTime::now_utc()).await?;
    info!(task_id = task.id, username = %identity.username(), "task created");
    Ok(task)
}

pub async fn list_tasks(
    repo: &dyn TaskRepository,
    identity: &Identity,
) -> Result<Vec<TaskReminder>, AppError> {
    Ok(repo.list_by_owner(identity.username()).await?)
}

pub async fn get_task(
    repo: &dyn TaskRepository,
    identity: &Identity,
    id: i64,
) -> Result<TaskReminder, AppError> {
    guard::authorize(identity, repo.get(id).await?, Action::View)
}

pub async fn update_task(
    repo: &dyn TaskRepository,
    identity: &Identity,
    id: i64,
    patch: TaskPatch,
) -> Result<TaskReminder, AppError> {
    guard::authorize(identity, repo.get(id).await?, Action::Modify)?;

    // Ownership never changes, so a row that vanished since the check is just gone.
    let task = repo
        .apply_partial_update(id, patch, identity.username(), OffsetDateTime::now_utc())
        .await?
        .ok_or(AppError::NotFound("Task"))?;
    info!(task_id = id, username = %identity.username(), "task updated");
    Ok(task)
}

pub async fn delete_task(
    repo: &dyn TaskRepository,
    identity: &Identity,
    id: i64,
) -> Result<(), AppError> {
    guard::authorize(identity, repo.get(id).await?, Action::Delete)?;
    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Task"));
    }
    info!(task_id = id, username = %identity.username(), "task deleted");
    Ok(())
}
