//! Device-local reminder scheduling seam
//!
//! Booking reminders live on the consumer device (the platform cannot
//! cancel them remotely), so the flows only talk to this trait. Failures
//! here are logged and never fail the surrounding flow.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("reminder scheduler unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Schedule a local notification after `delay`; returns its id
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        payload: Value,
        delay: std::time::Duration,
    ) -> Result<String, ReminderError>;

    /// Cancel a scheduled notification. Cancelling an unknown id is a no-op.
    async fn cancel(&self, reminder_id: &str) -> Result<(), ReminderError>;
}

/// Delay until 10:00 on the day before the booking, or `None` when that
/// instant is already past
pub fn booking_reminder_delay(
    booking: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<std::time::Duration> {
    let reminder_at = (booking - Duration::days(1))
        .date_naive()
        .and_hms_opt(10, 0, 0)?
        .and_utc();
    if reminder_at <= now {
        return None;
    }
    (reminder_at - now).to_std().ok()
}

/// Schedule the day-before booking reminder. Returns the reminder id to
/// store on the purchase token, or `None` when the reminder instant is past
/// or scheduling failed (never fatal to the booking flow).
pub async fn schedule_booking_reminder<R: ReminderScheduler>(
    scheduler: &R,
    booking: DateTime<Utc>,
    business_name: &str,
    purchase_token_id: i64,
) -> Option<String> {
    let Some(delay) = booking_reminder_delay(booking, Utc::now()) else {
        debug!(purchase_token_id, "Booking reminder instant already past, skipping");
        return None;
    };
    let body = format!("Your booking at {business_name} is tomorrow!");
    match scheduler
        .schedule(
            "Booking Reminder",
            &body,
            json!({ "purchaseTokenId": purchase_token_id }),
            delay,
        )
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(purchase_token_id, error = %e, "Could not schedule booking reminder");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reminder_fires_at_ten_the_day_before() {
        let booking = Utc.with_ymd_and_hms(2026, 8, 20, 19, 30, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap();
        let delay = booking_reminder_delay(booking, now).unwrap();
        let fire_at = now + Duration::from_std(delay).unwrap();
        assert_eq!(fire_at, Utc.with_ymd_and_hms(2026, 8, 19, 10, 0, 0).unwrap());
    }

    #[test]
    fn past_reminder_instant_is_skipped() {
        // Booking tomorrow at 09:00 — "10:00 the day before" is already gone
        let now = Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap();
        let booking = Utc.with_ymd_and_hms(2026, 8, 11, 9, 0, 0).unwrap();
        assert!(booking_reminder_delay(booking, now).is_none());
    }
}
