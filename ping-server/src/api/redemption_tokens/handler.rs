//! Redemption Token API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};
use shared::loyalty::BillReceipt;
use shared::models::{RedemptionToken, ScanReceipt, TokenStatus};

#[derive(Deserialize)]
pub struct CreateBody {
    pub purchase_token_id: i64,
}

/// POST /api/redemption-tokens - open a QR presentation attempt
pub async fn create(
    State(state): State<ServerState>,
    Json(body): Json<CreateBody>,
) -> AppResult<Json<AppResponse<RedemptionToken>>> {
    let token = state.redemption.create_token(body.purchase_token_id).await?;
    Ok(ok(token))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub purchase_token_id: i64,
}

/// GET /api/redemption-tokens?purchase_token_id=X - all tokens of a purchase
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<RedemptionToken>>>> {
    let tokens = crate::db::repository::redemption_token::list_by_purchase(
        state.pool(),
        query.purchase_token_id,
    )
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(ok(tokens))
}

/// GET /api/redemption-tokens/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<RedemptionToken>>> {
    let token = crate::db::repository::redemption_token::find_by_id(state.pool(), id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Redemption token {id}")))?;
    Ok(ok(token))
}

#[derive(Serialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// DELETE /api/redemption-tokens/{id} - teardown cleanup, unscanned only
pub async fn delete_unscanned(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<DeleteResult>>> {
    let deleted = state.redemption.delete_if_unscanned(id).await?;
    Ok(ok(DeleteResult { deleted }))
}

#[derive(Serialize)]
pub struct StatusSummary {
    pub redemption_token_id: i64,
    pub status: TokenStatus,
    pub scanned: bool,
    pub completed: bool,
    pub bill_input_total: Option<f64>,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub purchase_token_id: i64,
}

/// GET /api/redemption-tokens/status?purchase_token_id=X - latest-token summary
pub async fn status(
    State(state): State<ServerState>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<AppResponse<Option<StatusSummary>>>> {
    let token = state.redemption.status(query.purchase_token_id).await?;
    Ok(ok(token.map(|t| StatusSummary {
        redemption_token_id: t.id,
        status: t.status,
        scanned: t.scanned,
        completed: t.completed,
        bill_input_total: t.bill_input_total,
    })))
}

#[derive(Deserialize)]
pub struct ScanBody {
    pub purchase_token_id: i64,
    pub scanned_by: Option<String>,
}

/// POST /api/redemption-tokens/scan - staff gateway scan
pub async fn scan(
    State(state): State<ServerState>,
    Json(body): Json<ScanBody>,
) -> AppResult<Json<AppResponse<ScanReceipt>>> {
    let receipt = state
        .redemption
        .scan(body.purchase_token_id, body.scanned_by.as_deref())
        .await?;
    Ok(ok(receipt))
}

#[derive(Deserialize, Validate)]
pub struct CompleteBody {
    #[validate(range(min = 0.01, message = "bill amount must be positive"))]
    pub bill_amount: Option<f64>,
}

/// POST /api/redemption-tokens/{id}/complete - staff gateway completion
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<CompleteBody>,
) -> AppResult<Json<AppResponse<RedemptionToken>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let token = state.redemption.complete(id, body.bill_amount).await?;
    Ok(ok(token))
}

#[derive(Deserialize, Validate)]
pub struct ResubmitBody {
    #[validate(range(min = 0.01, message = "bill amount must be positive"))]
    pub bill_amount: f64,
}

/// POST /api/redemption-tokens/{id}/resubmit - staff re-entry after dispute
pub async fn resubmit(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<ResubmitBody>,
) -> AppResult<Json<AppResponse<RedemptionToken>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let token = state.redemption.resubmit(id, body.bill_amount).await?;
    Ok(ok(token))
}

/// POST /api/redemption-tokens/{id}/dispute - customer rejects the amount
pub async fn dispute(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<RedemptionToken>>> {
    let token = state.redemption.dispute(id).await?;
    Ok(ok(token))
}

#[derive(Deserialize)]
pub struct ConfirmBillBody {
    pub user_id: i64,
}

/// POST /api/redemption-tokens/{id}/confirm-bill - customer accepts the amount
pub async fn confirm_bill(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<ConfirmBillBody>,
) -> AppResult<Json<AppResponse<BillReceipt>>> {
    let receipt = state.redemption.confirm_bill(id, body.user_id).await?;
    Ok(ok(receipt))
}
