//! Claim Cancellation API module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/claims", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/business-cancel", post(handler::business_cancel))
}
