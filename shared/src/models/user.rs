//! User Model (loyalty/notification subset)
//!
//! Auth identity and session storage live elsewhere; this row subset exists
//! to credit points and address notifications.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    /// Cumulative loyalty points; tier is always derived from this total
    pub loyalty_points: i64,
    pub activate_notifications: bool,
    pub expo_push_token: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl User {
    /// Display name for staff-facing receipts, falling back to email
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.surname.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}
