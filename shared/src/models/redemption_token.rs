//! Redemption Token Model
//!
//! A redemption token is the single-use artifact behind one QR-presentation
//! attempt. At most one *unscanned* token exists per purchase token; scanned
//! tokens are never deleted.

use serde::{Deserialize, Serialize};

/// Workflow status of a redemption token.
///
/// Serialized values ("Pending", "In Progress", ...) are the wire contract
/// with the business-side application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TokenStatus {
    Pending,
    #[serde(rename = "In Progress")]
    #[cfg_attr(feature = "db", sqlx(rename = "In Progress"))]
    InProgress,
    Submitted,
    Rejected,
    Finished,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Pending => "Pending",
            TokenStatus::InProgress => "In Progress",
            TokenStatus::Submitted => "Submitted",
            TokenStatus::Rejected => "Rejected",
            TokenStatus::Finished => "Finished",
        }
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redemption token entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RedemptionToken {
    pub id: i64,
    pub purchase_token_id: i64,
    /// Denormalized from the purchase token at creation so the business app
    /// can render a scan without joins
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub offer_name: Option<String>,
    pub promotion_id: Option<i64>,
    pub business_id: Option<i64>,
    pub scanned: bool,
    pub status: TokenStatus,
    pub completed: bool,
    pub bill_input_total: Option<f64>,
    /// Platform's cut of the confirmed bill, recorded at confirmation
    pub platform_take: Option<f64>,
    /// RFC 3339 instant, set only when the token reaches `Finished`
    pub time_redeemed: Option<String>,
    /// `YYYY-MM-DD`, set only when the token reaches `Finished`
    pub date_redeemed: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl RedemptionToken {
    /// Terminal check used by transition guards
    pub fn is_finished(&self) -> bool {
        self.completed || self.status == TokenStatus::Finished
    }
}

/// Creation payload; display fields are captured from the owning purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionTokenCreate {
    pub purchase_token_id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub offer_name: Option<String>,
    pub promotion_id: Option<i64>,
    pub business_id: Option<i64>,
}

impl RedemptionTokenCreate {
    pub fn from_purchase(purchase: &super::PurchaseToken) -> Self {
        Self {
            purchase_token_id: purchase.id,
            customer_id: purchase.user_id,
            customer_name: purchase.user_email.clone(),
            offer_name: purchase.offer_name.clone(),
            promotion_id: purchase.offer_id,
            business_id: purchase.business_id,
        }
    }
}

/// What the business app shows staff right after a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReceipt {
    pub redemption_token_id: i64,
    pub purchase_token_id: i64,
    pub offer_id: Option<i64>,
    pub offer_name: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub purchase_type: Option<String>,
    pub customer_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_strings() {
        assert_eq!(
            serde_json::to_value(TokenStatus::InProgress).unwrap(),
            serde_json::json!("In Progress")
        );
        assert_eq!(TokenStatus::Pending.as_str(), "Pending");
        assert_eq!(TokenStatus::Finished.as_str(), "Finished");
        let parsed: TokenStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, TokenStatus::InProgress);
    }
}
