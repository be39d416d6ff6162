//! Redemption Token API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/redemption-tokens", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/status", get(handler::status))
        .route("/scan", post(handler::scan))
        .route(
            "/{id}",
            get(handler::get_by_id).delete(handler::delete_unscanned),
        )
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/resubmit", post(handler::resubmit))
        .route("/{id}/dispute", post(handler::dispute))
        .route("/{id}/confirm-bill", post(handler::confirm_bill))
}
