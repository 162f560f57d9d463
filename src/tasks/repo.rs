use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::tasks::repo_types::{NewTask, TaskPatch, TaskReminder, TaskRow};

/// Storage for reminder records. Each mutation is atomic for the row it targets.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Assigns an id and stamps `created_at = modified_at = now`.
    async fn create(&self, task: NewTask, now: OffsetDateTime) -> anyhow::Result<TaskReminder>;

    async fn get(&self, id: i64) -> anyhow::Result<Option<TaskReminder>>;

    /// Tasks created by `username`, in insertion order.
    async fn list_by_owner(&self, username: &str) -> anyhow::Result<Vec<TaskReminder>>;

    /// Applies the present patch fields and always stamps `modified_at`/`modified_by`.
    /// `None` if the task does not exist.
    async fn apply_partial_update(
        &self,
        id: i64,
        patch: TaskPatch,
        actor: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<TaskReminder>>;

    /// `false` if the task does not exist.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    db: PgPool,
}

impl PgTaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: NewTask, now: OffsetDateTime) -> anyhow::Result<TaskReminder> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO task_reminders
                (time_to_run, assignee, task_content, reminder_type, created_at, modified_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            RETURNING id, time_to_run, assignee, task_content, reminder_type,
                      created_at, modified_at, created_by, modified_by
            "#,
        )
        .bind(task.time_to_run)
        .bind(&task.assignee)
        .bind(&task.task_content)
        .bind(task.reminder_type.as_str())
        .bind(now)
        .bind(&task.created_by)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        row.try_into()
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<TaskReminder>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, time_to_run, assignee, task_content, reminder_type,
                   created_at, modified_at, created_by, modified_by
              FROM task_reminders
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get task")?;
        row.map(TaskReminder::try_from).transpose()
    }

    async fn list_by_owner(&self, username: &str) -> anyhow::Result<Vec<TaskReminder>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, time_to_run, assignee, task_content, reminder_type,
                   created_at, modified_at, created_by, modified_by
              FROM task_reminders
             WHERE created_by = $1
             ORDER BY id ASC
            "#,
        )
        .bind(username)
        .fetch_all(&self.db)
        .await
        .context("list tasks by owner")?;
        rows.into_iter().map(TaskReminder::try_from).collect()
    }

    async fn apply_partial_update(
        &self,
        id: i64,
        patch: TaskPatch,
        actor: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<TaskReminder>> {
        let TaskPatch {
            time_to_run,
            assignee,
            task_content,
            reminder_type,
        } = patch;

        // Single statement, so the row is never left half-patched.
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE task_reminders
               SET time_to_run   = COALESCE($2, time_to_run),
                   assignee      = COALESCE($3, assignee),
                   task_content  = COALESCE($4, task_content),
                   reminder_type = COALESCE($5, reminder_type),
                   modified_at   = GREATEST($6, modified_at),
                   modified_by   = $7
             WHERE id = $1
            RETURNING id, time_to_run, assignee, task_content, reminder_type,
                      created_at, modified_at, created_by, modified_by
            "#,
        )
        .bind(id)
        .bind(time_to_run)
        .bind(assignee)
        .bind(task_content)
        .bind(reminder_type.map(|t| t.as_str()))
        .bind(now)
        .bind(actor)
        .fetch_optional(&self.db)
        .await
        .context("update task")?;
        row.map(TaskReminder::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM task_reminders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete task")?;
        Ok(result.rows_affected() > 0)
    }
}
