//! API Routes
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`redemption_tokens`] - redemption token lifecycle (create, scan,
//!   complete, dispute, resubmit, confirm)
//! - [`claims`] - purchase token cancellation (consumer and business paths)

pub mod claims;
pub mod health;
pub mod redemption_tokens;

use crate::core::ServerState;
use axum::Router;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(redemption_tokens::router())
        .merge(claims::router())
}
