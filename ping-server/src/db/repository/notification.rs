//! In-App Notification Repository

use super::RepoResult;
use shared::models::{AppNotification, AppNotificationCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, user_id, name, content, read, category, offer_id, business_id, created FROM notifications";

pub async fn create(pool: &SqlitePool, data: AppNotificationCreate) -> RepoResult<AppNotification> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO notifications (id, user_id, name, content, read, category, offer_id, business_id, created) VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.user_id)
    .bind(&data.name)
    .bind(&data.content)
    .bind(&data.category)
    .bind(data.offer_id)
    .bind(data.business_id)
    .bind(now)
    .execute(pool)
    .await?;
    let sql = format!("{SELECT} WHERE id = ?");
    let created = sqlx::query_as::<_, AppNotification>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(created)
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<AppNotification>> {
    let sql = format!("{SELECT} WHERE user_id = ? ORDER BY created DESC");
    let rows = sqlx::query_as::<_, AppNotification>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
