//! Cancellation Service
//!
//! The simpler sibling of the redemption state machine: claim → cancelled,
//! with inventory rollback. Two entry points share one effect sequence —
//! the consumer path (eligibility-checked) and the business path (which
//! additionally notifies the consumer). Both must leave the purchase row
//! and the inventory counters in identical states.
//!
//! Step 1 (the terminal flag) must succeed or nothing happened; every later
//! step is best-effort and logged, never aborting the rest — once the claim
//! is cancelled there is no recovery path for a half-applied rollback other
//! than finishing it.

use crate::changefeed::ChangeFeedService;
use crate::db::repository::{RepoError, offer, offer_slot, purchase_token, user};
use crate::services::NotifierService;
use crate::utils::AppError;
use chrono::Utc;
use shared::changefeed::{ChangeEvent, TABLE_PURCHASE_TOKENS};
use shared::models::{CancelBlocked, PurchaseToken};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CancellationError {
    #[error("Purchase token not found: {0}")]
    NotFound(i64),

    #[error("Cannot cancel: {0}")]
    Blocked(#[from] CancelBlocked),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<CancellationError> for AppError {
    fn from(err: CancellationError) -> Self {
        match err {
            CancellationError::NotFound(_) => AppError::NotFound(err.to_string()),
            CancellationError::Blocked(_) => AppError::BusinessRule(err.to_string()),
            CancellationError::Repo(e) => AppError::Database(e.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CancellationService {
    pool: SqlitePool,
    feed: ChangeFeedService,
    notifier: NotifierService,
}

impl CancellationService {
    pub fn new(pool: SqlitePool, feed: ChangeFeedService, notifier: NotifierService) -> Self {
        Self {
            pool,
            feed,
            notifier,
        }
    }

    /// Consumer-initiated cancellation.
    ///
    /// Eligibility (all must hold): not terminal, pay-on-the-day, a
    /// booking-type offer, a confirmed booking date strictly more than 48
    /// hours away. The device-local booking reminder is the caller's to
    /// cancel — the server has no handle on it.
    pub async fn cancel_by_consumer(
        &self,
        purchase_token_id: i64,
    ) -> Result<PurchaseToken, CancellationError> {
        let purchase = self.load(purchase_token_id).await?;

        let offer = match purchase.offer_id {
            Some(oid) => offer::find_by_id(&self.pool, oid).await?,
            None => None,
        };
        let offer = offer.ok_or(CancelBlocked::NoBookingRequired)?;
        purchase.cancellable_with(&offer, Utc::now())?;

        let cancelled = self.apply(&purchase).await?;
        info!(purchase_token_id, "Claim cancelled by consumer");
        Ok(cancelled)
    }

    /// Business-initiated cancellation.
    ///
    /// Same record/inventory effects; the only asymmetry is the consumer
    /// notification (in-app row + push + email, with the optional reason).
    pub async fn cancel_by_business(
        &self,
        purchase_token_id: i64,
        reason: Option<String>,
    ) -> Result<PurchaseToken, CancellationError> {
        let purchase = self.load(purchase_token_id).await?;
        if purchase.redeemed {
            return Err(CancelBlocked::AlreadyRedeemed.into());
        }
        if purchase.cancelled {
            return Err(CancelBlocked::AlreadyCancelled.into());
        }

        let cancelled = self.apply(&purchase).await?;
        info!(purchase_token_id, "Claim cancelled by business");

        self.notify_consumer(&cancelled, reason).await;
        Ok(cancelled)
    }

    async fn load(&self, purchase_token_id: i64) -> Result<PurchaseToken, CancellationError> {
        purchase_token::find_by_id(&self.pool, purchase_token_id)
            .await?
            .ok_or(CancellationError::NotFound(purchase_token_id))
    }

    /// The shared effect sequence.
    async fn apply(&self, purchase: &PurchaseToken) -> Result<PurchaseToken, CancellationError> {
        // 1. Terminal flag — fail-hard; nothing has happened yet if this
        //    doesn't commit.
        if !purchase_token::mark_cancelled(&self.pool, purchase.id).await? {
            let current = self.load(purchase.id).await?;
            let blocked = if current.redeemed {
                CancelBlocked::AlreadyRedeemed
            } else {
                CancelBlocked::AlreadyCancelled
            };
            return Err(blocked.into());
        }

        // 2. Roll back the offer's sold counter (floor at zero).
        if let Some(offer_id) = purchase.offer_id {
            match offer::decrement_number_sold(&self.pool, offer_id).await {
                Ok(count) => {
                    tracing::debug!(offer_id, number_sold = count, "Sold counter rolled back")
                }
                Err(e) => warn!(offer_id, error = %e, "Could not roll back offer sold counter"),
            }
        }

        // 3. Roll back the slot's booked counter by the party size.
        if let Some(slot_id) = purchase.offer_slot {
            match offer_slot::decrement_booked(&self.pool, slot_id, purchase.party_size()).await {
                Ok(count) => {
                    tracing::debug!(slot_id, booked_count = count, "Slot counter rolled back")
                }
                Err(e) => warn!(slot_id, error = %e, "Could not roll back slot booked counter"),
            }
        }

        let after = self.load(purchase.id).await?;
        self.feed.publish(ChangeEvent::update(
            TABLE_PURCHASE_TOKENS,
            Some(purchase),
            &after,
        ));
        Ok(after)
    }

    async fn notify_consumer(&self, purchase: &PurchaseToken, reason: Option<String>) {
        let consumer = match user::find_by_id(&self.pool, purchase.user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(user_id = purchase.user_id, "Cancellation notification skipped: user gone");
                return;
            }
            Err(e) => {
                warn!(user_id = purchase.user_id, error = %e, "Cancellation notification skipped");
                return;
            }
        };

        let offer_name = purchase
            .offer_name
            .clone()
            .unwrap_or_else(|| "your offer".into());
        let business_name = match purchase.business_id {
            Some(bid) => crate::db::repository::business::find_by_id(&self.pool, bid)
                .await
                .ok()
                .flatten()
                .map(|b| b.name),
            None => None,
        }
        .unwrap_or_else(|| "The business".into());

        self.notifier.spawn_claim_cancelled(
            &consumer,
            &offer_name,
            &business_name,
            purchase.offer_id,
            purchase.business_id,
            purchase.id,
            reason,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::notification;
    use chrono::Duration;
    use shared::models::PurchaseTokenCreate;

    struct Harness {
        _dir: tempfile::TempDir,
        pool: SqlitePool,
        service: CancellationService,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = DbService::new(path.to_str().unwrap()).await.unwrap();
        let feed = ChangeFeedService::new();
        let notifier =
            NotifierService::new(db.pool.clone(), "http://127.0.0.1:9/push".into(), None);
        let service = CancellationService::new(db.pool.clone(), feed, notifier);
        Harness {
            _dir: dir,
            pool: db.pool,
            service,
        }
    }

    struct Seeded {
        purchase_id: i64,
        offer_id: i64,
        slot_id: i64,
        user_id: i64,
    }

    async fn seed(h: &Harness, hours_ahead: i64, quantity: Option<i64>) -> Seeded {
        let u = user::create(&h.pool, "diner@example.com", Some("Dana"), 0)
            .await
            .unwrap();
        let b = crate::db::repository::business::create(&h.pool, "The Fig Tree", Some(10.0))
            .await
            .unwrap();
        let o = offer::create(
            &h.pool,
            "Dinner for two",
            Some(b.id),
            5,
            true,
            Some("call"),
            true,
        )
        .await
        .unwrap();
        let slot = offer_slot::create(&h.pool, o.id, 10, 6, None).await.unwrap();
        let booking = (Utc::now() + Duration::hours(hours_ahead)).to_rfc3339();
        let p = purchase_token::create(
            &h.pool,
            PurchaseTokenCreate {
                offer_id: Some(o.id),
                offer_name: Some(o.name.clone()),
                business_id: Some(b.id),
                user_id: u.id,
                user_email: Some(u.email.clone()),
                purchase_type: None,
                customer_price: None,
                offer_slot: Some(slot.id),
                quantity,
                booking_confirmed: true,
                booking_date: Some(booking),
                booking_reminder_id: Some("reminder-1".into()),
            },
        )
        .await
        .unwrap();
        Seeded {
            purchase_id: p.id,
            offer_id: o.id,
            slot_id: slot.id,
            user_id: u.id,
        }
    }

    #[tokio::test]
    async fn consumer_cancel_rolls_back_inventory() {
        let h = harness().await;
        let s = seed(&h, 72, Some(3)).await;

        let cancelled = h.service.cancel_by_consumer(s.purchase_id).await.unwrap();
        assert!(cancelled.cancelled);
        assert!(!cancelled.redeemed);

        let o = offer::find_by_id(&h.pool, s.offer_id).await.unwrap().unwrap();
        assert_eq!(o.number_sold, 4);
        let slot = offer_slot::find_by_id(&h.pool, s.slot_id).await.unwrap().unwrap();
        assert_eq!(slot.booked_count, 3, "party of 3 released from a count of 6");
    }

    #[tokio::test]
    async fn cancel_inside_window_is_blocked() {
        let h = harness().await;
        let s = seed(&h, 47, None).await;
        let err = h.service.cancel_by_consumer(s.purchase_id).await.unwrap_err();
        assert!(matches!(
            err,
            CancellationError::Blocked(CancelBlocked::InsideWindow)
        ));
    }

    #[tokio::test]
    async fn second_cancel_is_blocked() {
        let h = harness().await;
        let s = seed(&h, 72, None).await;
        h.service.cancel_by_consumer(s.purchase_id).await.unwrap();
        let err = h.service.cancel_by_consumer(s.purchase_id).await.unwrap_err();
        assert!(matches!(
            err,
            CancellationError::Blocked(CancelBlocked::AlreadyCancelled)
        ));
        // Counter rolled back exactly once
        let o = offer::find_by_id(&h.pool, s.offer_id).await.unwrap().unwrap();
        assert_eq!(o.number_sold, 4);
    }

    #[tokio::test]
    async fn counters_never_go_negative() {
        let h = harness().await;
        let s = seed(&h, 72, Some(50)).await;

        // Drain the counters below what the rollback would subtract
        for _ in 0..10 {
            offer::decrement_number_sold(&h.pool, s.offer_id).await.unwrap();
        }
        let o = offer::find_by_id(&h.pool, s.offer_id).await.unwrap().unwrap();
        assert_eq!(o.number_sold, 0);
        offer::decrement_number_sold(&h.pool, s.offer_id).await.unwrap();
        let o = offer::find_by_id(&h.pool, s.offer_id).await.unwrap().unwrap();
        assert_eq!(o.number_sold, 0);

        h.service.cancel_by_consumer(s.purchase_id).await.unwrap();
        let slot = offer_slot::find_by_id(&h.pool, s.slot_id).await.unwrap().unwrap();
        assert_eq!(slot.booked_count, 0, "party of 50 floors the count of 6 at zero");
    }

    #[tokio::test]
    async fn business_cancel_skips_window_and_notifies() {
        let h = harness().await;
        let s = seed(&h, 2, None).await; // well inside 48h — business may still cancel

        h.service
            .cancel_by_business(s.purchase_id, Some("Kitchen flooded".into()))
            .await
            .unwrap();

        let p = purchase_token::find_by_id(&h.pool, s.purchase_id)
            .await
            .unwrap()
            .unwrap();
        assert!(p.cancelled);

        // In-app row is written from a spawned task; give it a beat.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let rows = notification::list_by_user(&h.pool, s.user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].content.contains("Kitchen flooded"));
        assert_eq!(rows[0].category, "offer");
    }

    #[tokio::test]
    async fn consumer_and_business_paths_leave_identical_rows() {
        let h = harness().await;
        let a = seed(&h, 72, Some(2)).await;
        let b = seed(&h, 72, Some(2)).await;

        h.service.cancel_by_consumer(a.purchase_id).await.unwrap();
        h.service.cancel_by_business(b.purchase_id, None).await.unwrap();

        let pa = purchase_token::find_by_id(&h.pool, a.purchase_id).await.unwrap().unwrap();
        let pb = purchase_token::find_by_id(&h.pool, b.purchase_id).await.unwrap().unwrap();
        assert_eq!((pa.redeemed, pa.cancelled), (pb.redeemed, pb.cancelled));

        let oa = offer::find_by_id(&h.pool, a.offer_id).await.unwrap().unwrap();
        let ob = offer::find_by_id(&h.pool, b.offer_id).await.unwrap().unwrap();
        assert_eq!(oa.number_sold, ob.number_sold);

        let sa = offer_slot::find_by_id(&h.pool, a.slot_id).await.unwrap().unwrap();
        let sb = offer_slot::find_by_id(&h.pool, b.slot_id).await.unwrap().unwrap();
        assert_eq!(sa.booked_count, sb.booked_count);

        // Only the business path writes a notification row
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let rows_a = notification::list_by_user(&h.pool, a.user_id).await.unwrap();
        let rows_b = notification::list_by_user(&h.pool, b.user_id).await.unwrap();
        assert!(rows_a.is_empty());
        assert_eq!(rows_b.len(), 1);
    }
}
