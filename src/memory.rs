//! In-process stores backed by a lock around a map. Used by tests and for running
//! without a database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::{
    auth::{
        repo::{InsertUserError, UserStore},
        repo_types::User,
    },
    tasks::{
        repo::TaskRepository,
        repo_types::{NewTask, TaskPatch, TaskReminder},
    },
};

#[derive(Default)]
struct UserTable {
    next_id: i64,
    by_username: HashMap<String, User>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<UserTable>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.inner.read().await.by_username.get(username).cloned())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, InsertUserError> {
        let mut table = self.inner.write().await;
        if table.by_username.contains_key(username) {
            return Err(InsertUserError::Duplicate);
        }
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        table.by_username.insert(user.username.clone(), user.clone());
        Ok(user)
    }
}

#[derive(Default)]
struct TaskTable {
    next_id: i64,
    rows: BTreeMap<i64, TaskReminder>,
}

#[derive(Default)]
pub struct MemoryTaskRepository {
    inner: RwLock<TaskTable>,
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: NewTask, now: OffsetDateTime) -> anyhow::Result<TaskReminder> {
        let mut table = self.inner.write().await;
        table.next_id += 1;
        let task = task.into_task(table.next_id, now);
        table.rows.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<TaskReminder>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn list_by_owner(&self, username: &str) -> anyhow::Result<Vec<TaskReminder>> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .filter(|t| t.created_by == username)
            .cloned()
            .collect())
    }

    async fn apply_partial_update(
        &self,
        id: i64,
        patch: TaskPatch,
        actor: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<TaskReminder>> {
        let mut table = self.inner.write().await;
        let Some(task) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(task, actor, now);
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}
