//! Redemption transition errors
//!
//! Precondition failures are first-class outcomes here — a rejected
//! double-scan or double-complete is the state machine working, not an
//! exceptional condition — so each gets its own variant and a stable
//! message the clients can show.

use crate::db::repository::RepoError;
use crate::utils::AppError;
use shared::models::TokenStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("Purchase token not found: {0}")]
    PurchaseNotFound(i64),

    #[error("Redemption token not found: {0}")]
    TokenNotFound(i64),

    #[error("Redemption token not found. Customer may not have opened their QR code yet.")]
    NoActiveToken,

    #[error("This offer has already been redeemed")]
    AlreadyRedeemed,

    #[error("This QR code has already been scanned")]
    AlreadyScanned,

    #[error("This redemption has already been completed")]
    AlreadyCompleted,

    #[error("Cannot proceed: status is '{actual}', expected '{expected}'")]
    InvalidStatus {
        expected: TokenStatus,
        actual: TokenStatus,
    },

    #[error("Invalid bill amount")]
    InvalidBillAmount,

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<RedemptionError> for AppError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::PurchaseNotFound(_)
            | RedemptionError::TokenNotFound(_)
            | RedemptionError::NoActiveToken
            | RedemptionError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            RedemptionError::AlreadyRedeemed
            | RedemptionError::AlreadyScanned
            | RedemptionError::AlreadyCompleted => AppError::Conflict(err.to_string()),
            RedemptionError::InvalidStatus { .. } => AppError::BusinessRule(err.to_string()),
            RedemptionError::InvalidBillAmount => AppError::Validation(err.to_string()),
            RedemptionError::Repo(e) => AppError::Database(e.to_string()),
        }
    }
}
