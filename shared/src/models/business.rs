//! Business Model (redemption-relevant subset)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Business {
    pub id: i64,
    pub name: String,
    /// Platform take on confirmed bills, as a percentage
    pub cut_percent: Option<f64>,
    pub created: i64,
    pub updated: i64,
}
