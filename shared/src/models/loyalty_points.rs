//! Loyalty Points Ledger Models

use serde::{Deserialize, Serialize};

/// Append-only ledger entry; one row per credit or manual adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyPointsEntry {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    pub reason: String,
    pub offer_id: Option<i64>,
    pub created: i64,
}

/// Create ledger entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyPointsCreate {
    pub user_id: i64,
    pub points: i64,
    pub reason: String,
    pub offer_id: Option<i64>,
}
