//! Ownership checks applied to every task operation.
//!
//! A request moves `Unauthenticated → Authenticated` when its token resolves to an
//! [`Identity`]; from there it is either `Authorized` (the caller created the task)
//! or `Forbidden`. A missing record ends the request as not-found before ownership
//! is looked at.

use tracing::warn;

use crate::{auth::Identity, error::AppError, tasks::repo_types::TaskReminder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Modify,
    Delete,
}

impl Action {
    fn denial(self) -> &'static str {
        match self {
            Action::View => "Not authorized to view this task",
            Action::Modify => "Not authorized to modify this task",
            Action::Delete => "Not authorized to delete this task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authorized,
    Forbidden,
}

pub fn check_owner(identity: &Identity, task: &TaskReminder) -> Access {
    if task.created_by == identity.username() {
        Access::Authorized
    } else {
        Access::Forbidden
    }
}

/// Existence first, then ownership. Returns the task when the caller may act on it.
pub fn authorize(
    identity: &Identity,
    task: Option<TaskReminder>,
    action: Action,
) -> Result<TaskReminder, AppError> {
    let task = task.ok_or(AppError::NotFound("Task"))?;
    match check_owner(identity, &task) {
        Access::Authorized => Ok(task),
        Access::Forbidden => {
            warn!(
                task_id = task.id,
                username = %identity.username(),
                action = ?action,
                "task access denied"
            );
            Err(AppError::Forbidden(action.denial()))
        }
    }
}

/// A username claimed in a request body (`created_by` on create) must be the caller.
pub fn check_claimed_user(
    identity: &Identity,
    claimed: Option<&str>,
    denial: &'static str,
) -> Result<(), AppError> {
    match claimed {
        Some(name) if name != identity.username() => {
            warn!(
                username = %identity.username(),
                claimed = %name,
                "request claims to act as another user"
            );
            Err(AppError::Forbidden(denial))
        }
        _ => Ok(()),
    }
}
