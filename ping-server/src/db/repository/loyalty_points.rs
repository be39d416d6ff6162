//! Loyalty Points Ledger Repository

use super::RepoResult;
use shared::models::{LoyaltyPointsCreate, LoyaltyPointsEntry};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, user_id, points, reason, offer_id, created FROM loyalty_points";

pub async fn append(pool: &SqlitePool, data: LoyaltyPointsCreate) -> RepoResult<LoyaltyPointsEntry> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO loyalty_points (id, user_id, points, reason, offer_id, created) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.user_id)
    .bind(data.points)
    .bind(&data.reason)
    .bind(data.offer_id)
    .bind(now)
    .execute(pool)
    .await?;
    let sql = format!("{SELECT} WHERE id = ?");
    let created = sqlx::query_as::<_, LoyaltyPointsEntry>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(created)
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<LoyaltyPointsEntry>> {
    let sql = format!("{SELECT} WHERE user_id = ? ORDER BY created DESC");
    let rows = sqlx::query_as::<_, LoyaltyPointsEntry>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
