use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    error::AppError,
    tasks::repo_types::{ReminderType, TaskPatch},
};

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub time_to_run: OffsetDateTime,
    pub assignee: String,
    pub task_content: String,
    pub reminder_type: ReminderType,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update body. Unknown fields (including `id`, `created_by`, `created_at`)
/// are rejected rather than ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time_to_run: Option<OffsetDateTime>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub task_content: Option<String>,
    #[serde(default)]
    pub reminder_type: Option<ReminderType>,
    /// Accepted for compatibility with existing clients; the stored modifier is
    /// always the caller.
    #[serde(default)]
    pub modified_by: Option<String>,
}

fn check_len(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("assignee", &self.assignee)?;
        if let Some(created_by) = &self.created_by {
            check_len("created_by", created_by)?;
        }
        Ok(())
    }
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(assignee) = &self.assignee {
            check_len("assignee", assignee)?;
        }
        if let Some(modified_by) = &self.modified_by {
            check_len("modified_by", modified_by)?;
        }
        Ok(())
    }

    pub fn into_patch(self) -> TaskPatch {
        let UpdateTaskRequest {
            time_to_run,
            assignee,
            task_content,
            reminder_type,
            modified_by: _,
        } = self;
        TaskPatch {
            time_to_run,
            assignee,
            task_content,
            reminder_type,
        }
    }
}
