//! Repository Layer
//!
//! Free async functions over `&SqlitePool`, one module per table. Every
//! mutation that implements a state-machine guard is a conditional UPDATE
//! or DELETE restating its precondition in the WHERE clause and reporting
//! `rows_affected` back to the caller; the service layer turns a zero into
//! the matching precondition error.

pub mod business;
pub mod loyalty_points;
pub mod notification;
pub mod offer;
pub mod offer_slot;
pub mod purchase_token;
pub mod redemption_token;
pub mod user;

use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        RepoError::Database(e.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
