//! Offer Slot Repository

use super::RepoResult;
use shared::models::OfferSlot;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str =
    "SELECT id, offer_id, capacity, booked_count, slot_start, created, updated FROM offer_slots";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<OfferSlot>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, OfferSlot>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    offer_id: i64,
    capacity: i64,
    booked_count: i64,
    slot_start: Option<&str>,
) -> RepoResult<OfferSlot> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO offer_slots (id, offer_id, capacity, booked_count, slot_start, created, updated) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(offer_id)
    .bind(capacity)
    .bind(booked_count)
    .bind(slot_start)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create offer slot".into()))?;
    Ok(created)
}

/// Floor-at-zero decrement of the booked counter by a party size.
/// Re-fetches before computing, same policy as the offer sold counter.
pub async fn decrement_booked(pool: &SqlitePool, id: i64, by: i64) -> RepoResult<i64> {
    let Some(slot) = find_by_id(pool, id).await? else {
        return Ok(0);
    };
    let new_count = (slot.booked_count - by.max(0)).max(0);
    sqlx::query("UPDATE offer_slots SET booked_count = ?, updated = ? WHERE id = ?")
        .bind(new_count)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(new_count)
}
