//! In-App Notification Models

use serde::{Deserialize, Serialize};

/// In-app notification row shown in the consumer's notification centre
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AppNotification {
    pub id: i64,
    pub user_id: i64,
    /// Title
    pub name: String,
    pub content: String,
    pub read: bool,
    pub category: String,
    pub offer_id: Option<i64>,
    pub business_id: Option<i64>,
    pub created: i64,
}

/// Create notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotificationCreate {
    pub user_id: i64,
    pub name: String,
    pub content: String,
    pub category: String,
    pub offer_id: Option<i64>,
    pub business_id: Option<i64>,
}
