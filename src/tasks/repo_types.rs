use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// How the reminder is delivered. Any other value is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderType {
    Email,
    Slack,
}

impl ReminderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderType::Email => "Email",
            ReminderType::Slack => "Slack",
        }
    }
}

impl FromStr for ReminderType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Email" => Ok(ReminderType::Email),
            "Slack" => Ok(ReminderType::Slack),
            other => anyhow::bail!("unknown reminder type {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReminder {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub time_to_run: OffsetDateTime,
    pub assignee: String,
    pub task_content: String,
    pub reminder_type: ReminderType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub created_by: String,
    pub modified_by: Option<String>,
}

/// Row as stored; `reminder_type` is text in the database.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub time_to_run: OffsetDateTime,
    pub assignee: String,
    pub task_content: String,
    pub reminder_type: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
    pub created_by: String,
    pub modified_by: Option<String>,
}

impl TryFrom<TaskRow> for TaskReminder {
    type Error = anyhow::Error;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            time_to_run: r.time_to_run,
            assignee: r.assignee,
            task_content: r.task_content,
            reminder_type: r.reminder_type.parse()?,
            created_at: r.created_at,
            modified_at: r.modified_at,
            created_by: r.created_by,
            modified_by: r.modified_by,
        })
    }
}

/// Everything needed to insert a task; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub time_to_run: OffsetDateTime,
    pub assignee: String,
    pub task_content: String,
    pub reminder_type: ReminderType,
    pub created_by: String,
}

impl NewTask {
    pub fn into_task(self, id: i64, now: OffsetDateTime) -> TaskReminder {
        TaskReminder {
            id,
            time_to_run: self.time_to_run,
            assignee: self.assignee,
            task_content: self.task_content,
            reminder_type: self.reminder_type,
            created_at: now,
            modified_at: now,
            created_by: self.created_by,
            modified_by: None,
        }
    }
}

/// The mutable fields of a task. `None` leaves the field untouched.
///
/// `id`, `created_at` and `created_by` are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub time_to_run: Option<OffsetDateTime>,
    pub assignee: Option<String>,
    pub task_content: Option<String>,
    pub reminder_type: Option<ReminderType>,
}

impl TaskPatch {
    /// Applies the present fields and stamps the modifier. `modified_at` never moves
    /// backwards, even if the clock does.
    pub fn apply(self, task: &mut TaskReminder, actor: &str, now: OffsetDateTime) {
        let TaskPatch {
            time_to_run,
            assignee,
            task_content,
            reminder_type,
        } = self;

        if let Some(v) = time_to_run {
            task.time_to_run = v;
        }
        if let Some(v) = assignee {
            task.assignee = v;
        }
        if let Some(v) = task_content {
            task.task_content = v;
        }
        if let Some(v) = reminder_type {
            task.reminder_type = v;
        }
        task.modified_at = now.max(task.modified_at);
        task.modified_by = Some(actor.to_owned());
    }
}
