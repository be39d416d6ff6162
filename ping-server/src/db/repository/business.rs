//! Business Repository (redemption-relevant subset)

use super::RepoResult;
use shared::models::Business;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, name, cut_percent, created, updated FROM businesses";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Business>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Business>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, name: &str, cut_percent: Option<f64>) -> RepoResult<Business> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO businesses (id, name, cut_percent, created, updated) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(cut_percent)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create business".into()))?;
    Ok(created)
}
