//! Offer Repository (redemption-relevant subset)

use super::RepoResult;
use shared::models::Offer;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, name, business_id, number_sold, requires_booking, booking_type, bill_input_required, created, updated FROM offers";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Offer>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Offer>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Seed helper for claim-side code and tests
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    business_id: Option<i64>,
    number_sold: i64,
    requires_booking: bool,
    booking_type: Option<&str>,
    bill_input_required: bool,
) -> RepoResult<Offer> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO offers (id, name, business_id, number_sold, requires_booking, booking_type, bill_input_required, created, updated) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(business_id)
    .bind(number_sold)
    .bind(requires_booking)
    .bind(booking_type)
    .bind(bill_input_required)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create offer".into()))?;
    Ok(created)
}

/// Floor-at-zero decrement of the sold counter.
///
/// Re-fetches the current count immediately before writing, per the shared
/// counter policy: decrements are expressed against the freshest value, not
/// as absolute sets.
pub async fn decrement_number_sold(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let Some(offer) = find_by_id(pool, id).await? else {
        return Ok(0);
    };
    let new_count = (offer.number_sold - 1).max(0);
    sqlx::query("UPDATE offers SET number_sold = ?, updated = ? WHERE id = ?")
        .bind(new_count)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(new_count)
}
