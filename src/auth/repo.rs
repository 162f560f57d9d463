use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;

#[derive(Debug, thiserror::Error)]
pub enum InsertUserError {
    #[error("username already taken")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Username → credential storage. Implementations must make `insert` the uniqueness
/// check: of two concurrent inserts for one username, exactly one succeeds.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, InsertUserError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, InsertUserError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                InsertUserError::Duplicate
            }
            other => InsertUserError::Other(other.into()),
        })
    }
}
