use std::sync::Arc;

use crate::auth::{
    password,
    repo::{PgUserStore, UserStore},
};
use crate::config::AppConfig;
use crate::db;
use crate::memory::{MemoryTaskRepository, MemoryUserStore};
use crate::tasks::repo::{PgTaskRepository, TaskRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl AppState {
    /// Reads config from the environment, connects to Postgres and applies migrations.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        password::ensure_dummy_hash()?;

        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        let users = Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>;
        let tasks = Arc::new(PgTaskRepository::new(pool)) as Arc<dyn TaskRepository>;
        Ok(Self::from_parts(Arc::new(config), users, tasks))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            config,
            users,
            tasks,
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            Arc::new(config),
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryTaskRepository::default()),
        )
    }
}
