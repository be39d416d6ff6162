//! Purchase Token Model
//!
//! A purchase token is a consumer's claim on an offer. Offer details are
//! denormalized onto the row at claim time so the claim survives offer
//! edits and deletes. `redeemed` and `cancelled` are terminal and mutually
//! exclusive; once either is set the row takes no further redemption or
//! cancellation transitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Offer;

/// Pricing model of a claim, derived from `customer_price`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentModel {
    /// Paid at claim time; completion is a one-step finish
    PayUpFront,
    /// Settled at the venue; completion routes through bill confirmation
    PayOnTheDay,
}

/// Purchase token entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseToken {
    pub id: i64,
    pub offer_id: Option<i64>,
    pub offer_name: Option<String>,
    pub business_id: Option<i64>,
    pub user_id: i64,
    pub user_email: Option<String>,
    pub purchase_type: Option<String>,
    /// Present only for pay-up-front claims; absence signals pay-on-the-day
    pub customer_price: Option<f64>,
    /// Capacity-limited slot the claim booked into, if any
    pub offer_slot: Option<i64>,
    /// Party size booked into the slot (legacy rows have none; treat as 1)
    pub quantity: Option<i64>,
    pub booking_confirmed: bool,
    /// RFC 3339 instant of the confirmed booking
    pub booking_date: Option<String>,
    /// Device-local scheduled reminder to cancel on rebook/cancellation
    pub booking_reminder_id: Option<String>,
    pub redeemed: bool,
    pub cancelled: bool,
    pub created: i64,
    pub updated: i64,
}

/// Creation payload (claim flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseTokenCreate {
    pub offer_id: Option<i64>,
    pub offer_name: Option<String>,
    pub business_id: Option<i64>,
    pub user_id: i64,
    pub user_email: Option<String>,
    pub purchase_type: Option<String>,
    pub customer_price: Option<f64>,
    pub offer_slot: Option<i64>,
    pub quantity: Option<i64>,
    pub booking_confirmed: bool,
    pub booking_date: Option<String>,
    pub booking_reminder_id: Option<String>,
}

/// Why a consumer-initiated cancellation is not allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CancelBlocked {
    #[error("claim has already been redeemed")]
    AlreadyRedeemed,
    #[error("claim is already cancelled")]
    AlreadyCancelled,
    #[error("pay-up-front claims cannot be cancelled by the customer")]
    PayUpFront,
    #[error("offer does not require a booking")]
    NoBookingRequired,
    #[error("no confirmed booking date")]
    BookingNotConfirmed,
    #[error("booking date could not be parsed")]
    InvalidBookingDate,
    #[error("booking is less than 48 hours away")]
    InsideWindow,
}

impl PurchaseToken {
    pub fn payment_model(&self) -> PaymentModel {
        if self.customer_price.is_some() {
            PaymentModel::PayUpFront
        } else {
            PaymentModel::PayOnTheDay
        }
    }

    /// Party size for slot bookkeeping; legacy rows default to 1
    pub fn party_size(&self) -> i64 {
        self.quantity.unwrap_or(1).max(1)
    }

    /// Consumer-initiated cancellation eligibility.
    ///
    /// All conditions must hold: not terminal, pay-on-the-day, a
    /// booking-type offer, a confirmed booking date, and that date strictly
    /// more than 48 hours after `now` (exactly 48h is not cancellable).
    pub fn cancellable_with(&self, offer: &Offer, now: DateTime<Utc>) -> Result<(), CancelBlocked> {
        if self.redeemed {
            return Err(CancelBlocked::AlreadyRedeemed);
        }
        if self.cancelled {
            return Err(CancelBlocked::AlreadyCancelled);
        }
        if self.customer_price.is_some() {
            return Err(CancelBlocked::PayUpFront);
        }
        if !offer.booking_required() {
            return Err(CancelBlocked::NoBookingRequired);
        }
        if !self.booking_confirmed {
            return Err(CancelBlocked::BookingNotConfirmed);
        }
        let Some(raw) = self.booking_date.as_deref() else {
            return Err(CancelBlocked::BookingNotConfirmed);
        };
        let booking = DateTime::parse_from_rfc3339(raw)
            .map_err(|_| CancelBlocked::InvalidBookingDate)?
            .with_timezone(&Utc);
        if booking - now > Duration::hours(48) {
            Ok(())
        } else {
            Err(CancelBlocked::InsideWindow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_offer() -> Offer {
        Offer {
            id: 1,
            name: "Two-course dinner".into(),
            business_id: Some(5),
            number_sold: 3,
            requires_booking: true,
            booking_type: Some("call".into()),
            bill_input_required: true,
            created: 0,
            updated: 0,
        }
    }

    fn cancellable_purchase(booking: DateTime<Utc>) -> PurchaseToken {
        PurchaseToken {
            id: 10,
            offer_id: Some(1),
            offer_name: Some("Two-course dinner".into()),
            business_id: Some(5),
            user_id: 77,
            user_email: Some("diner@example.com".into()),
            purchase_type: Some("Pay on the day".into()),
            customer_price: None,
            offer_slot: None,
            quantity: None,
            booking_confirmed: true,
            booking_date: Some(booking.to_rfc3339()),
            booking_reminder_id: None,
            redeemed: false,
            cancelled: false,
            created: 0,
            updated: 0,
        }
    }

    #[test]
    fn payment_model_follows_customer_price() {
        let now = Utc::now();
        let mut p = cancellable_purchase(now);
        assert_eq!(p.payment_model(), PaymentModel::PayOnTheDay);
        p.customer_price = Some(25.0);
        assert_eq!(p.payment_model(), PaymentModel::PayUpFront);
    }

    #[test]
    fn exactly_48h_is_not_cancellable() {
        let now = Utc::now();
        let p = cancellable_purchase(now + Duration::hours(48));
        assert_eq!(
            p.cancellable_with(&booking_offer(), now),
            Err(CancelBlocked::InsideWindow)
        );
    }

    #[test]
    fn one_second_past_48h_is_cancellable() {
        let now = Utc::now();
        let p = cancellable_purchase(now + Duration::hours(48) + Duration::seconds(1));
        assert_eq!(p.cancellable_with(&booking_offer(), now), Ok(()));
    }

    #[test]
    fn terminal_and_model_guards() {
        let now = Utc::now();
        let far = now + Duration::hours(72);
        let offer = booking_offer();

        let mut p = cancellable_purchase(far);
        p.redeemed = true;
        assert_eq!(
            p.cancellable_with(&offer, now),
            Err(CancelBlocked::AlreadyRedeemed)
        );

        let mut p = cancellable_purchase(far);
        p.cancelled = true;
        assert_eq!(
            p.cancellable_with(&offer, now),
            Err(CancelBlocked::AlreadyCancelled)
        );

        let mut p = cancellable_purchase(far);
        p.customer_price = Some(15.0);
        assert_eq!(
            p.cancellable_with(&offer, now),
            Err(CancelBlocked::PayUpFront)
        );

        let mut p = cancellable_purchase(far);
        p.booking_confirmed = false;
        assert_eq!(
            p.cancellable_with(&offer, now),
            Err(CancelBlocked::BookingNotConfirmed)
        );

        let p = cancellable_purchase(far);
        let mut walk_in = offer.clone();
        walk_in.requires_booking = false;
        walk_in.booking_type = None;
        assert_eq!(
            p.cancellable_with(&walk_in, now),
            Err(CancelBlocked::NoBookingRequired)
        );
    }

    #[test]
    fn party_size_defaults_to_one() {
        let now = Utc::now();
        let mut p = cancellable_purchase(now);
        assert_eq!(p.party_size(), 1);
        p.quantity = Some(4);
        assert_eq!(p.party_size(), 4);
        p.quantity = Some(0);
        assert_eq!(p.party_size(), 1);
    }
}
