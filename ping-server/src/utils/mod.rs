//! Utilities
//!
//! - [`error`] - application error type and response envelope
//! - [`result`] - Result aliases
//! - [`logger`] - tracing subscriber setup

pub mod error;
pub mod logger;
pub mod result;

pub use error::{AppError, AppResponse, ok};
pub use result::AppResult;
