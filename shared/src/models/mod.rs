//! Data Models
//!
//! Row types shared between the server, the consumer core and tests. Field
//! names are the wire contract with the business-side application; the
//! redemption-token fields `status`, `scanned`, `completed`,
//! `bill_input_total` and `purchase_token_id` in particular must be
//! preserved byte-for-byte.

mod business;
mod loyalty_points;
mod notification;
mod offer;
mod purchase_token;
mod redemption_token;
mod user;

pub use business::Business;
pub use loyalty_points::{LoyaltyPointsCreate, LoyaltyPointsEntry};
pub use notification::{AppNotification, AppNotificationCreate};
pub use offer::{Offer, OfferSlot};
pub use purchase_token::{CancelBlocked, PaymentModel, PurchaseToken, PurchaseTokenCreate};
pub use redemption_token::{
    RedemptionToken, RedemptionTokenCreate, ScanReceipt, TokenStatus,
};
pub use user::User;
