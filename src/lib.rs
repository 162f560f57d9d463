//! Task reminder service: users register, log in for a bearer token, and manage
//! reminders that only their creator can see or change.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod state;
pub mod tasks;

pub use error::AppError;
pub use state::AppState;
