//! User Repository (loyalty/notification subset)

use super::RepoResult;
use shared::models::User;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, email, first_name, surname, loyalty_points, activate_notifications, expo_push_token, created, updated FROM users";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    first_name: Option<&str>,
    loyalty_points: i64,
) -> RepoResult<User> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO users (id, email, first_name, loyalty_points, activate_notifications, created, updated) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(email)
    .bind(first_name)
    .bind(loyalty_points)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    let created = find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create user".into()))?;
    Ok(created)
}

/// Absolute set of the cumulative total; the caller computed it from a
/// fresh read. Tier is never stored — it is derived from this value.
pub async fn set_loyalty_points(pool: &SqlitePool, id: i64, points: i64) -> RepoResult<()> {
    sqlx::query("UPDATE users SET loyalty_points = ?, updated = ? WHERE id = ?")
        .bind(points)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
