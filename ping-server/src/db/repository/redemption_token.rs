//! Redemption Token Repository
//!
//! Every state-machine transition here is a conditional UPDATE whose WHERE
//! clause restates the precondition, so a late duplicate scan or completion
//! loses the race instead of corrupting the row.

use super::RepoResult;
use shared::models::{RedemptionToken, RedemptionTokenCreate};
use shared::util::{now_millis, now_rfc3339, snowflake_id, today_ymd};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, purchase_token_id, customer_id, customer_name, offer_name, promotion_id, business_id, scanned, status, completed, bill_input_total, platform_take, time_redeemed, date_redeemed, created, updated FROM redemption_tokens";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RedemptionToken>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, RedemptionToken>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_by_purchase(
    pool: &SqlitePool,
    purchase_token_id: i64,
) -> RepoResult<Vec<RedemptionToken>> {
    let sql = format!("{SELECT} WHERE purchase_token_id = ? ORDER BY created DESC");
    let rows = sqlx::query_as::<_, RedemptionToken>(&sql)
        .bind(purchase_token_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// The finished token for a purchase, if one exists (at most one can)
pub async fn find_finished_by_purchase(
    pool: &SqlitePool,
    purchase_token_id: i64,
) -> RepoResult<Option<RedemptionToken>> {
    let sql = format!("{SELECT} WHERE purchase_token_id = ? AND status = 'Finished' LIMIT 1");
    let row = sqlx::query_as::<_, RedemptionToken>(&sql)
        .bind(purchase_token_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Most recent non-finished token — the one a scan targets
pub async fn find_latest_active_by_purchase(
    pool: &SqlitePool,
    purchase_token_id: i64,
) -> RepoResult<Option<RedemptionToken>> {
    let sql = format!(
        "{SELECT} WHERE purchase_token_id = ? AND status != 'Finished' ORDER BY created DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, RedemptionToken>(&sql)
        .bind(purchase_token_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: RedemptionTokenCreate) -> RepoResult<RedemptionToken> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO redemption_tokens (id, purchase_token_id, customer_id, customer_name, offer_name, promotion_id, business_id, scanned, status, completed, created, updated) VALUES (?, ?, ?, ?, ?, ?, ?, 0, 'Pending', 0, ?, ?)",
    )
    .bind(id)
    .bind(data.purchase_token_id)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(&data.offer_name)
    .bind(data.promotion_id)
    .bind(data.business_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create redemption token".into()))?;
    Ok(created)
}

/// Abandoned-attempt cleanup: drop every unscanned token of a purchase.
/// Returns the deleted rows (for the change feed).
pub async fn delete_unscanned_by_purchase(
    pool: &SqlitePool,
    purchase_token_id: i64,
) -> RepoResult<Vec<RedemptionToken>> {
    let sql = format!("{SELECT} WHERE purchase_token_id = ? AND scanned = 0");
    let doomed = sqlx::query_as::<_, RedemptionToken>(&sql)
        .bind(purchase_token_id)
        .fetch_all(pool)
        .await?;
    if !doomed.is_empty() {
        sqlx::query("DELETE FROM redemption_tokens WHERE purchase_token_id = ? AND scanned = 0")
            .bind(purchase_token_id)
            .execute(pool)
            .await?;
    }
    Ok(doomed)
}

/// Teardown cleanup: delete one token only while it is still unscanned.
/// The guard makes the race with an in-flight scan safe — a token that
/// became meaningful survives.
pub async fn delete_if_unscanned(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM redemption_tokens WHERE id = ? AND scanned = 0")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

/// scan: `scanned=false → scanned=true, status='In Progress'`
pub async fn mark_scanned(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET scanned = 1, status = 'In Progress', updated = ? WHERE id = ? AND scanned = 0 AND status != 'Finished' AND completed = 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// One-step finish (pay-up-front): stamps the redemption instant and writes
/// the known price as the bill total
pub async fn finish_with_amount(pool: &SqlitePool, id: i64, amount: f64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET status = 'Finished', completed = 1, bill_input_total = ?, time_redeemed = ?, date_redeemed = ?, updated = ? WHERE id = ? AND status != 'Finished' AND completed = 0",
    )
    .bind(amount)
    .bind(now_rfc3339())
    .bind(today_ymd())
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Staff bill entry (pay-on-the-day): parks the token in `Submitted`
/// awaiting customer confirmation
pub async fn submit_bill(pool: &SqlitePool, id: i64, amount: f64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET status = 'Submitted', bill_input_total = ?, updated = ? WHERE id = ? AND status != 'Finished' AND completed = 0",
    )
    .bind(amount)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Customer confirmation: `Submitted → Finished`, recording the platform take
pub async fn finish_submitted(
    pool: &SqlitePool,
    id: i64,
    platform_take: Option<f64>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET status = 'Finished', completed = 1, platform_take = ?, time_redeemed = ?, date_redeemed = ?, updated = ? WHERE id = ? AND status = 'Submitted' AND completed = 0",
    )
    .bind(platform_take)
    .bind(now_rfc3339())
    .bind(today_ymd())
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Customer dispute: `Submitted → Rejected`
pub async fn reject_submitted(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET status = 'Rejected', updated = ? WHERE id = ? AND status = 'Submitted' AND completed = 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Staff re-entry after a dispute: `Rejected → Submitted` with the new amount
pub async fn resubmit_bill(pool: &SqlitePool, id: i64, amount: f64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE redemption_tokens SET status = 'Submitted', bill_input_total = ?, updated = ? WHERE id = ? AND status = 'Rejected' AND completed = 0",
    )
    .bind(amount)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}
