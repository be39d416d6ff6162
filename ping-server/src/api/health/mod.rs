//! Health Check

use crate::core::ServerState;
use crate::utils::{AppResponse, ok};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<AppResponse<Value>> {
    ok(json!({ "status": "ok" }))
}
