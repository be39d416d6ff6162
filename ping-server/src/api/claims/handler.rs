//! Claim Cancellation API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};
use shared::models::PurchaseToken;

/// POST /api/claims/{id}/cancel - consumer-initiated cancellation
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<PurchaseToken>>> {
    let cancelled = state.cancellation.cancel_by_consumer(id).await?;
    Ok(ok(cancelled))
}

#[derive(Deserialize, Validate, Default)]
pub struct BusinessCancelBody {
    #[validate(length(max = 500, message = "reason too long"))]
    pub reason: Option<String>,
}

/// POST /api/claims/{id}/business-cancel - business-initiated cancellation
pub async fn business_cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<BusinessCancelBody>,
) -> AppResult<Json<AppResponse<PurchaseToken>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let cancelled = state.cancellation.cancel_by_business(id, body.reason).await?;
    Ok(ok(cancelled))
}
