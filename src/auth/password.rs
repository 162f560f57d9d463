use anyhow::{anyhow, Context};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Verified against when the username is unknown, so a miss costs as much as a hit.
    static ref DUMMY_HASH: Option<String> = match hash_password("dummy-password-for-timing") {
        Ok(hash) => Some(hash),
        Err(e) => {
            error!(error = %e, "failed to build dummy password hash");
            None
        }
    };
}

/// Argon2id with a fresh random salt; the PHC string carries salt and parameters.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "failed to hash password");
            anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be used.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow!("parse password hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "password verification failed");
            Err(anyhow!("verify password: {e}"))
        }
    }
}

/// Runs [`hash_password`] on the blocking pool so request workers are not stalled.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("password verification task failed")?
}

/// Builds the dummy hash up front so a failure surfaces at startup.
pub fn ensure_dummy_hash() -> anyhow::Result<()> {
    DUMMY_HASH
        .as_ref()
        .map(|_| ())
        .ok_or_else(|| anyhow!("dummy password hash unavailable"))
}

/// Burns one verification for a login attempt against an unknown user.
pub async fn verify_dummy_blocking(plain: String) {
    match DUMMY_HASH.clone() {
        Some(hash) => {
            let _ = verify_password_blocking(plain, hash).await;
        }
        // Hashing costs about as much as verifying.
        None => {
            let _ = hash_password_blocking(plain).await;
        }
    }
}
