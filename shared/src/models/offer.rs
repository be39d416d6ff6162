//! Offer & Offer Slot Models (redemption-relevant subset)

use serde::{Deserialize, Serialize};

/// Offer entity — only the fields the redemption and cancellation flows read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Offer {
    pub id: i64,
    pub name: String,
    pub business_id: Option<i64>,
    /// Floor-at-zero sold counter, rolled back on cancellation
    pub number_sold: i64,
    pub requires_booking: bool,
    /// `external` | `call`; either implies a booking-type offer
    pub booking_type: Option<String>,
    /// Whether staff enter a bill at the venue (pay-on-the-day offers)
    pub bill_input_required: bool,
    pub created: i64,
    pub updated: i64,
}

impl Offer {
    pub fn booking_required(&self) -> bool {
        self.requires_booking
            || matches!(self.booking_type.as_deref(), Some("external") | Some("call"))
    }
}

/// Capacity-limited time slot of an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OfferSlot {
    pub id: i64,
    pub offer_id: i64,
    pub capacity: i64,
    /// Floor-at-zero booked counter, decremented by party size on cancellation
    pub booked_count: i64,
    /// RFC 3339 start of the slot
    pub slot_start: Option<String>,
    pub created: i64,
    pub updated: i64,
}
