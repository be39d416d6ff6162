//! Purchase Token Repository

use super::RepoResult;
use shared::models::{PurchaseToken, PurchaseTokenCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, offer_id, offer_name, business_id, user_id, user_email, purchase_type, customer_price, offer_slot, quantity, booking_confirmed, booking_date, booking_reminder_id, redeemed, cancelled, created, updated FROM purchase_tokens";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PurchaseToken>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, PurchaseToken>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: PurchaseTokenCreate) -> RepoResult<PurchaseToken> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO purchase_tokens (id, offer_id, offer_name, business_id, user_id, user_email, purchase_type, customer_price, offer_slot, quantity, booking_confirmed, booking_date, booking_reminder_id, redeemed, cancelled, created, updated) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)",
    )
    .bind(id)
    .bind(data.offer_id)
    .bind(&data.offer_name)
    .bind(data.business_id)
    .bind(data.user_id)
    .bind(&data.user_email)
    .bind(&data.purchase_type)
    .bind(data.customer_price)
    .bind(data.offer_slot)
    .bind(data.quantity)
    .bind(data.booking_confirmed)
    .bind(&data.booking_date)
    .bind(&data.booking_reminder_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create purchase token".into()))?;
    Ok(created)
}

/// Terminal transition: claim → redeemed. Conditional on the row not being
/// terminal yet; returns false when a concurrent transition won.
pub async fn mark_redeemed(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE purchase_tokens SET redeemed = 1, updated = ? WHERE id = ? AND redeemed = 0 AND cancelled = 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

/// Terminal transition: claim → cancelled. Same guard as [`mark_redeemed`].
pub async fn mark_cancelled(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE purchase_tokens SET cancelled = 1, updated = ? WHERE id = ? AND redeemed = 0 AND cancelled = 0",
    )
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}
