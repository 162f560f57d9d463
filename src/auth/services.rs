use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        extractors::BearerToken,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo::{InsertUserError, UserStore},
        repo_types::User,
    },
    error::AppError,
    state::AppState,
};

const MAX_PASSWORD_BYTES: usize = 1024;

/// The authenticated caller of a request.
///
/// Only produced by [`resolve_identity`], so holding one means the token verified
/// and its subject still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: i64,
    username: String,
}

impl Identity {
    pub(crate) fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.@+-]{1,100}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub(crate) fn validate_credentials_input(username: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_username(username) {
        return Err(AppError::Validation(
            "username must be 1-100 characters of letters, digits or _.@+-".into(),
        ));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation("password is too long".into()));
    }
    Ok(())
}

/// Stores a new user with a hashed password. A taken username is `DuplicateUser`,
/// whichever of several concurrent registrations loses the race.
pub async fn register(users: &dyn UserStore, username: &str, password: &str) -> Result<User, AppError> {
    validate_credentials_input(username, password)?;

    let hash = hash_password_blocking(password.to_owned()).await?;
    match users.insert(username, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            Ok(user)
        }
        Err(InsertUserError::Duplicate) => {
            warn!(username = %username, "username already registered");
            Err(AppError::DuplicateUser)
        }
        Err(InsertUserError::Other(e)) => Err(AppError::Internal(e)),
    }
}

/// True only if the user exists and the password matches its stored hash.
pub async fn verify_credentials(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    match users.find_by_username(username).await? {
        Some(user) => verify_password_blocking(password.to_owned(), user.password_hash).await,
        None => {
            verify_dummy_blocking(password.to_owned()).await;
            Ok(false)
        }
    }
}

/// Checks credentials and issues an access token. Unknown user and wrong password
/// are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> Result<String, AppError> {
    if !verify_credentials(users, username, password).await? {
        warn!(username = %username, "login failed");
        return Err(AppError::InvalidCredentials);
    }
    let token = keys.issue(username)?;
    info!(username = %username, "user logged in");
    Ok(token)
}

/// Turns a bearer token into the acting user. Every failure is `Unauthenticated`;
/// the precise reason is only logged.
pub async fn resolve_identity(
    users: &dyn UserStore,
    keys: &JwtKeys,
    token: Option<&str>,
) -> Result<Identity, AppError> {
    let Some(token) = token else {
        warn!("missing bearer token");
        return Err(AppError::Unauthenticated);
    };

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        AppError::Unauthenticated
    })?;

    match users.find_by_username(&claims.sub).await? {
        Some(user) => Ok(Identity::new(user.id, user.username)),
        None => {
            warn!(username = %claims.sub, "token subject does not exist");
            Err(AppError::Unauthenticated)
        }
    }
}

impl AppState {
    /// Resolves the caller of a protected request.
    pub async fn identify(&self, bearer: &BearerToken) -> Result<Identity, AppError> {
        let keys = JwtKeys::from_ref(self);
        resolve_identity(self.users.as_ref(), &keys, bearer.token()).await
    }
}
