//! Consumer-initiated claim cancellation
//!
//! The eligibility rules live on the shared model
//! ([`PurchaseToken::cancellable_with`]) and are checked here before the
//! round trip so the user gets an immediate answer; the platform re-checks
//! them authoritatively. After the platform applies the cancellation the
//! device-local booking reminder is cancelled — best-effort, like every
//! side effect downstream of the committed state change.

use chrono::Utc;
use shared::models::{Offer, PurchaseToken};
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::reminders::ReminderScheduler;
use crate::store::ClaimStore;

pub async fn cancel_claim<S, R>(
    store: &S,
    reminders: &R,
    purchase: &PurchaseToken,
    offer: &Offer,
) -> ClientResult<PurchaseToken>
where
    S: ClaimStore,
    R: ReminderScheduler,
{
    purchase
        .cancellable_with(offer, Utc::now())
        .map_err(ClientError::CancelBlocked)?;

    let cancelled = store.cancel_claim(purchase.id).await?;
    info!(purchase_token_id = purchase.id, "Claim cancelled");

    if let Some(reminder_id) = purchase.booking_reminder_id.as_deref()
        && let Err(e) = reminders.cancel(reminder_id).await
    {
        warn!(
            purchase_token_id = purchase.id,
            reminder_id,
            error = %e,
            "Could not cancel booking reminder"
        );
    }

    Ok(cancelled)
}
