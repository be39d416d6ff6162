//! RedemptionService - transition execution and side effects
//!
//! # Transition flow
//!
//! ```text
//! transition(args)
//!     ├─ 1. Load current rows, check preconditions
//!     ├─ 2. Conditional update (precondition re-stated in WHERE)
//!     ├─ 3. rows_affected == 0 → precondition error, no mutation
//!     ├─ 4. Secondary effects (purchase flag, loyalty credit) — logged, not rolled back
//!     ├─ 5. Publish change events
//!     └─ 6. Fire-and-forget notifications
//! ```
//!
//! State consistency takes priority over notification delivery: nothing
//! downstream of a committed update can fail the transition.

use super::RedemptionError;
use crate::changefeed::ChangeFeedService;
use crate::db::repository::{
    business, loyalty_points, purchase_token, redemption_token, user,
};
use crate::services::NotifierService;
use shared::changefeed::{ChangeEvent, TABLE_PURCHASE_TOKENS, TABLE_REDEMPTION_TOKENS};
use shared::loyalty::{BillReceipt, points_for_bill, tier_for_points};
use shared::models::{
    LoyaltyPointsCreate, PaymentModel, RedemptionToken, RedemptionTokenCreate, ScanReceipt,
};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

type Result<T> = std::result::Result<T, RedemptionError>;

#[derive(Clone, Debug)]
pub struct RedemptionService {
    pool: SqlitePool,
    feed: ChangeFeedService,
    notifier: NotifierService,
}

impl RedemptionService {
    pub fn new(pool: SqlitePool, feed: ChangeFeedService, notifier: NotifierService) -> Self {
        Self {
            pool,
            feed,
            notifier,
        }
    }

    /// Create a fresh `Pending` token for a purchase.
    ///
    /// Preconditions: no `Finished` token exists for the purchase. Any
    /// unscanned sibling left by an abandoned attempt is deleted first, so
    /// re-opening the QR screen is idempotent — at most one unscanned token
    /// per purchase ever exists.
    pub async fn create_token(&self, purchase_token_id: i64) -> Result<RedemptionToken> {
        let purchase = purchase_token::find_by_id(&self.pool, purchase_token_id)
            .await?
            .ok_or(RedemptionError::PurchaseNotFound(purchase_token_id))?;

        if redemption_token::find_finished_by_purchase(&self.pool, purchase_token_id)
            .await?
            .is_some()
        {
            return Err(RedemptionError::AlreadyRedeemed);
        }

        let removed =
            redemption_token::delete_unscanned_by_purchase(&self.pool, purchase_token_id).await?;
        for old in &removed {
            debug!(token_id = old.id, purchase_token_id, "Deleted abandoned unscanned token");
            self.feed
                .publish(ChangeEvent::delete(TABLE_REDEMPTION_TOKENS, old));
        }

        let token = redemption_token::create(
            &self.pool,
            RedemptionTokenCreate::from_purchase(&purchase),
        )
        .await?;
        info!(token_id = token.id, purchase_token_id, "Created redemption token");
        self.feed
            .publish(ChangeEvent::insert(TABLE_REDEMPTION_TOKENS, &token));
        Ok(token)
    }

    /// Consumer teardown: delete a token only while it is still unscanned.
    /// Returns whether a row was removed.
    pub async fn delete_if_unscanned(&self, token_id: i64) -> Result<bool> {
        let before = redemption_token::find_by_id(&self.pool, token_id).await?;
        let deleted = redemption_token::delete_if_unscanned(&self.pool, token_id).await?;
        if deleted && let Some(old) = before {
            debug!(token_id, "Deleted unscanned redemption token on teardown");
            self.feed
                .publish(ChangeEvent::delete(TABLE_REDEMPTION_TOKENS, &old));
        }
        Ok(deleted)
    }

    /// Staff scan of the purchase QR code.
    ///
    /// Flips the most recent active token to `In Progress` and returns the
    /// denormalized details the business app shows for confirmation.
    pub async fn scan(
        &self,
        purchase_token_id: i64,
        scanned_by: Option<&str>,
    ) -> Result<ScanReceipt> {
        if redemption_token::find_finished_by_purchase(&self.pool, purchase_token_id)
            .await?
            .is_some()
        {
            return Err(RedemptionError::AlreadyRedeemed);
        }

        let token =
            redemption_token::find_latest_active_by_purchase(&self.pool, purchase_token_id)
                .await?
                .ok_or(RedemptionError::NoActiveToken)?;

        let purchase = purchase_token::find_by_id(&self.pool, purchase_token_id)
            .await?
            .ok_or(RedemptionError::PurchaseNotFound(purchase_token_id))?;

        let customer_name = match user::find_by_id(&self.pool, purchase.user_id).await? {
            Some(u) => u.display_name(),
            None => purchase
                .user_email
                .clone()
                .unwrap_or_else(|| "Unknown Customer".into()),
        };

        if !redemption_token::mark_scanned(&self.pool, token.id).await? {
            return Err(RedemptionError::AlreadyScanned);
        }

        let updated = redemption_token::find_by_id(&self.pool, token.id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token.id))?;
        info!(
            token_id = token.id,
            purchase_token_id,
            scanned_by = scanned_by.unwrap_or("-"),
            "Redemption token scanned"
        );
        self.feed.publish(ChangeEvent::update(
            TABLE_REDEMPTION_TOKENS,
            Some(&token),
            &updated,
        ));

        Ok(ScanReceipt {
            redemption_token_id: token.id,
            purchase_token_id,
            offer_id: purchase.offer_id,
            offer_name: purchase.offer_name.clone(),
            customer_name,
            customer_email: purchase.user_email.clone(),
            purchase_type: purchase.purchase_type.clone(),
            customer_price: purchase.customer_price,
        })
    }

    /// Staff completion.
    ///
    /// Pay-up-front purchases finish in one step with the known price as the
    /// bill total and the purchase marked redeemed. Pay-on-the-day purchases
    /// require a bill amount and park in `Submitted` until the customer
    /// confirms; the purchase is *not* redeemed yet.
    pub async fn complete(
        &self,
        token_id: i64,
        bill_amount: Option<f64>,
    ) -> Result<RedemptionToken> {
        let token = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        if token.is_finished() {
            return Err(RedemptionError::AlreadyCompleted);
        }

        let purchase = purchase_token::find_by_id(&self.pool, token.purchase_token_id)
            .await?
            .ok_or(RedemptionError::PurchaseNotFound(token.purchase_token_id))?;

        match purchase.payment_model() {
            PaymentModel::PayUpFront => {
                let amount = purchase.customer_price.unwrap_or(0.0);
                if !redemption_token::finish_with_amount(&self.pool, token_id, amount).await? {
                    return Err(RedemptionError::AlreadyCompleted);
                }
                info!(token_id, amount, "Redemption finished (pay up front)");
                self.mark_purchase_redeemed(purchase.id).await;
            }
            PaymentModel::PayOnTheDay => {
                let amount = bill_amount.ok_or(RedemptionError::InvalidBillAmount)?;
                if amount <= 0.0 {
                    return Err(RedemptionError::InvalidBillAmount);
                }
                if !redemption_token::submit_bill(&self.pool, token_id, amount).await? {
                    return Err(RedemptionError::AlreadyCompleted);
                }
                info!(token_id, amount, "Bill submitted, awaiting customer confirmation");
            }
        }

        let updated = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        self.feed.publish(ChangeEvent::update(
            TABLE_REDEMPTION_TOKENS,
            Some(&token),
            &updated,
        ));
        Ok(updated)
    }

    /// Customer accepts the submitted bill.
    ///
    /// The conditional `Submitted → Finished` update is the commit point:
    /// whichever caller wins it owns the loyalty credit, so a duplicate
    /// confirmation can never double-credit. Everything after the commit is
    /// logged on failure and never rolled back.
    pub async fn confirm_bill(&self, token_id: i64, user_id: i64) -> Result<BillReceipt> {
        let token = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        if token.completed {
            return Err(RedemptionError::AlreadyCompleted);
        }
        if token.status != shared::models::TokenStatus::Submitted {
            return Err(RedemptionError::InvalidStatus {
                expected: shared::models::TokenStatus::Submitted,
                actual: token.status,
            });
        }

        let bill = token.bill_input_total.unwrap_or(0.0);
        if bill <= 0.0 {
            return Err(RedemptionError::InvalidBillAmount);
        }

        let customer = user::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(RedemptionError::UserNotFound(user_id))?;

        let platform_take = match token.business_id {
            Some(bid) => business::find_by_id(&self.pool, bid)
                .await?
                .and_then(|b| b.cut_percent)
                .map(|pct| bill * (pct / 100.0)),
            None => None,
        };

        if !redemption_token::finish_submitted(&self.pool, token_id, platform_take).await? {
            // A concurrent confirm or a staff resubmission won the race.
            let current = redemption_token::find_by_id(&self.pool, token_id)
                .await?
                .ok_or(RedemptionError::TokenNotFound(token_id))?;
            if current.completed {
                return Err(RedemptionError::AlreadyCompleted);
            }
            return Err(RedemptionError::InvalidStatus {
                expected: shared::models::TokenStatus::Submitted,
                actual: current.status,
            });
        }

        // Loyalty credit: recompute the tier from the cumulative total on
        // both sides of the credit; the tier is never tracked incrementally.
        let points_earned = points_for_bill(bill);
        let old_points = customer.loyalty_points;
        let new_points = old_points + points_earned;
        let previous_tier = tier_for_points(old_points);
        let new_tier = tier_for_points(new_points);

        if let Err(e) = user::set_loyalty_points(&self.pool, user_id, new_points).await {
            error!(user_id, error = %e, "Failed to credit loyalty points after bill confirmation");
        }

        let offer_name = token.offer_name.clone().unwrap_or_else(|| "Offer".into());
        if let Err(e) = loyalty_points::append(
            &self.pool,
            LoyaltyPointsCreate {
                user_id,
                points: points_earned,
                reason: format!("Redeemed: {offer_name}"),
                offer_id: token.promotion_id,
            },
        )
        .await
        {
            // Balance is already credited; the ledger row is best-effort.
            warn!(user_id, error = %e, "Failed to append loyalty ledger entry");
        }

        self.mark_purchase_redeemed(token.purchase_token_id).await;

        let updated = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        info!(
            token_id,
            user_id, bill, points_earned, "Bill confirmed, redemption finished"
        );
        self.feed.publish(ChangeEvent::update(
            TABLE_REDEMPTION_TOKENS,
            Some(&token),
            &updated,
        ));

        self.notifier
            .spawn_points_earned(&customer, points_earned, &offer_name);
        if new_tier != previous_tier {
            self.notifier.spawn_tier_upgrade(&customer, new_tier.as_str());
        }

        Ok(BillReceipt {
            redemption_token_id: token_id,
            points_earned,
            new_points_total: new_points,
            previous_tier,
            new_tier,
            tier_changed: new_tier != previous_tier,
        })
    }

    /// Customer rejects the submitted amount; staff will re-enter it
    pub async fn dispute(&self, token_id: i64) -> Result<RedemptionToken> {
        let token = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        if token.is_finished() {
            return Err(RedemptionError::AlreadyCompleted);
        }
        if !redemption_token::reject_submitted(&self.pool, token_id).await? {
            return Err(RedemptionError::InvalidStatus {
                expected: shared::models::TokenStatus::Submitted,
                actual: token.status,
            });
        }
        let updated = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        info!(token_id, "Bill disputed, awaiting staff resubmission");
        self.feed.publish(ChangeEvent::update(
            TABLE_REDEMPTION_TOKENS,
            Some(&token),
            &updated,
        ));
        Ok(updated)
    }

    /// Staff re-enters the amount after a dispute
    pub async fn resubmit(&self, token_id: i64, bill_amount: f64) -> Result<RedemptionToken> {
        if bill_amount <= 0.0 {
            return Err(RedemptionError::InvalidBillAmount);
        }
        let token = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        if token.is_finished() {
            return Err(RedemptionError::AlreadyCompleted);
        }
        if !redemption_token::resubmit_bill(&self.pool, token_id, bill_amount).await? {
            return Err(RedemptionError::InvalidStatus {
                expected: shared::models::TokenStatus::Rejected,
                actual: token.status,
            });
        }
        let updated = redemption_token::find_by_id(&self.pool, token_id)
            .await?
            .ok_or(RedemptionError::TokenNotFound(token_id))?;
        info!(token_id, bill_amount, "Bill resubmitted after dispute");
        self.feed.publish(ChangeEvent::update(
            TABLE_REDEMPTION_TOKENS,
            Some(&token),
            &updated,
        ));
        Ok(updated)
    }

    /// Latest-token status summary (business app poll fallback)
    pub async fn status(&self, purchase_token_id: i64) -> Result<Option<RedemptionToken>> {
        if let Some(finished) =
            redemption_token::find_finished_by_purchase(&self.pool, purchase_token_id).await?
        {
            return Ok(Some(finished));
        }
        Ok(redemption_token::find_latest_active_by_purchase(&self.pool, purchase_token_id).await?)
    }

    /// Mark the purchase redeemed after a finishing transition. The token is
    /// already terminal, so a failure here is reported loudly but cannot
    /// roll the transition back.
    async fn mark_purchase_redeemed(&self, purchase_token_id: i64) {
        let before = purchase_token::find_by_id(&self.pool, purchase_token_id)
            .await
            .ok()
            .flatten();
        match purchase_token::mark_redeemed(&self.pool, purchase_token_id).await {
            Ok(true) => {
                if let Ok(Some(after)) =
                    purchase_token::find_by_id(&self.pool, purchase_token_id).await
                {
                    self.feed.publish(ChangeEvent::update(
                        TABLE_PURCHASE_TOKENS,
                        before.as_ref(),
                        &after,
                    ));
                }
            }
            Ok(false) => {
                warn!(purchase_token_id, "Purchase token already terminal while marking redeemed");
            }
            Err(e) => {
                error!(purchase_token_id, error = %e, "Failed to mark purchase token redeemed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::offer;
    use shared::models::{PurchaseTokenCreate, TokenStatus};

    struct Harness {
        _dir: tempfile::TempDir,
        pool: SqlitePool,
        service: RedemptionService,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = DbService::new(path.to_str().unwrap()).await.unwrap();
        let feed = ChangeFeedService::new();
        let notifier = NotifierService::new(
            db.pool.clone(),
            "http://127.0.0.1:9/push".into(),
            None,
        );
        let service = RedemptionService::new(db.pool.clone(), feed, notifier);
        Harness {
            _dir: dir,
            pool: db.pool,
            service,
        }
    }

    async fn seed_purchase(h: &Harness, customer_price: Option<f64>) -> (i64, i64) {
        let u = user::create(&h.pool, "diner@example.com", Some("Dana"), 0)
            .await
            .unwrap();
        let o = offer::create(&h.pool, "Lunch deal", None, 1, false, None, customer_price.is_none())
            .await
            .unwrap();
        let p = purchase_token::create(
            &h.pool,
            PurchaseTokenCreate {
                offer_id: Some(o.id),
                offer_name: Some(o.name.clone()),
                business_id: None,
                user_id: u.id,
                user_email: Some(u.email.clone()),
                purchase_type: None,
                customer_price,
                offer_slot: None,
                quantity: None,
                booking_confirmed: false,
                booking_date: None,
                booking_reminder_id: None,
            },
        )
        .await
        .unwrap();
        (p.id, u.id)
    }

    #[tokio::test]
    async fn reopening_qr_screen_leaves_one_token() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;

        let first = h.service.create_token(pid).await.unwrap();
        let second = h.service.create_token(pid).await.unwrap();
        assert_ne!(first.id, second.id);

        let all = redemption_token::list_by_purchase(&h.pool, pid).await.unwrap();
        assert_eq!(all.len(), 1, "second open must delete the first unscanned token");
        assert_eq!(all[0].id, second.id);
    }

    #[tokio::test]
    async fn scan_succeeds_once_then_rejects() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        h.service.create_token(pid).await.unwrap();

        let receipt = h.service.scan(pid, Some("staff-1")).await.unwrap();
        assert_eq!(receipt.purchase_token_id, pid);
        assert_eq!(receipt.customer_name, "Dana");

        let err = h.service.scan(pid, Some("staff-1")).await.unwrap_err();
        assert!(matches!(err, RedemptionError::AlreadyScanned));
    }

    #[tokio::test]
    async fn scan_without_open_qr_screen_is_rejected() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        let err = h.service.scan(pid, None).await.unwrap_err();
        assert!(matches!(err, RedemptionError::NoActiveToken));
    }

    #[tokio::test]
    async fn pay_up_front_completes_in_one_step() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, Some(25.0)).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();

        let finished = h.service.complete(token.id, None).await.unwrap();
        assert_eq!(finished.status, TokenStatus::Finished);
        assert!(finished.completed);
        assert_eq!(finished.bill_input_total, Some(25.0));
        assert!(finished.time_redeemed.is_some());
        assert!(finished.date_redeemed.is_some());

        let purchase = purchase_token::find_by_id(&h.pool, pid).await.unwrap().unwrap();
        assert!(purchase.redeemed);
    }

    #[tokio::test]
    async fn pay_on_the_day_parks_in_submitted() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();

        let submitted = h.service.complete(token.id, Some(42.50)).await.unwrap();
        assert_eq!(submitted.status, TokenStatus::Submitted);
        assert!(!submitted.completed);
        assert_eq!(submitted.bill_input_total, Some(42.50));

        // Not redeemed until the customer confirms
        let purchase = purchase_token::find_by_id(&h.pool, pid).await.unwrap().unwrap();
        assert!(!purchase.redeemed);
    }

    #[tokio::test]
    async fn pay_on_the_day_requires_a_bill_amount() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();

        let err = h.service.complete(token.id, None).await.unwrap_err();
        assert!(matches!(err, RedemptionError::InvalidBillAmount));
        let err = h.service.complete(token.id, Some(0.0)).await.unwrap_err();
        assert!(matches!(err, RedemptionError::InvalidBillAmount));
    }

    #[tokio::test]
    async fn complete_rejects_second_attempt() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, Some(15.0)).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, None).await.unwrap();

        let err = h.service.complete(token.id, None).await.unwrap_err();
        assert!(matches!(err, RedemptionError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn confirm_credits_floor_points_and_finishes() {
        let h = harness().await;
        let (pid, uid) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, Some(10.04)).await.unwrap();

        let receipt = h.service.confirm_bill(token.id, uid).await.unwrap();
        assert_eq!(receipt.points_earned, 100);
        assert_eq!(receipt.new_points_total, 100);
        assert!(receipt.tier_changed, "0 → 100 points crosses into hero");
        assert_eq!(receipt.new_tier, shared::LoyaltyTier::Hero);

        let finished = redemption_token::find_by_id(&h.pool, token.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(finished.status, TokenStatus::Finished);
        let purchase = purchase_token::find_by_id(&h.pool, pid).await.unwrap().unwrap();
        assert!(purchase.redeemed);

        let ledger = loyalty_points::list_by_user(&h.pool, uid).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].points, 100);
    }

    #[tokio::test]
    async fn confirm_rejects_outside_submitted() {
        let h = harness().await;
        let (pid, uid) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();

        let err = h.service.confirm_bill(token.id, uid).await.unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::InvalidStatus {
                expected: TokenStatus::Submitted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn second_confirm_is_rejected_without_double_credit() {
        let h = harness().await;
        let (pid, uid) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, Some(50.0)).await.unwrap();
        h.service.confirm_bill(token.id, uid).await.unwrap();

        let err = h.service.confirm_bill(token.id, uid).await.unwrap_err();
        assert!(matches!(err, RedemptionError::AlreadyCompleted));

        let u = user::find_by_id(&h.pool, uid).await.unwrap().unwrap();
        assert_eq!(u.loyalty_points, 500, "points credited exactly once");
    }

    #[tokio::test]
    async fn dispute_then_resubmit_carries_new_amount() {
        let h = harness().await;
        let (pid, uid) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, Some(50.0)).await.unwrap();

        let rejected = h.service.dispute(token.id).await.unwrap();
        assert_eq!(rejected.status, TokenStatus::Rejected);
        // Purchase untouched by the dispute
        let purchase = purchase_token::find_by_id(&h.pool, pid).await.unwrap().unwrap();
        assert!(!purchase.redeemed);

        let resubmitted = h.service.resubmit(token.id, 45.0).await.unwrap();
        assert_eq!(resubmitted.status, TokenStatus::Submitted);
        assert_eq!(resubmitted.bill_input_total, Some(45.0));

        let receipt = h.service.confirm_bill(token.id, uid).await.unwrap();
        assert_eq!(receipt.points_earned, 450, "points follow the resubmitted amount");
    }

    #[tokio::test]
    async fn resubmit_requires_rejected_status() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, Some(50.0)).await.unwrap();

        let err = h.service.resubmit(token.id, 45.0).await.unwrap_err();
        assert!(matches!(err, RedemptionError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn create_after_finish_is_rejected() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, Some(20.0)).await;
        let token = h.service.create_token(pid).await.unwrap();
        h.service.scan(pid, None).await.unwrap();
        h.service.complete(token.id, None).await.unwrap();

        let err = h.service.create_token(pid).await.unwrap_err();
        assert!(matches!(err, RedemptionError::AlreadyRedeemed));
        let err = h.service.scan(pid, None).await.unwrap_err();
        assert!(matches!(err, RedemptionError::AlreadyRedeemed));
    }

    #[tokio::test]
    async fn teardown_delete_spares_scanned_tokens() {
        let h = harness().await;
        let (pid, _) = seed_purchase(&h, None).await;
        let token = h.service.create_token(pid).await.unwrap();

        h.service.scan(pid, None).await.unwrap();
        let deleted = h.service.delete_if_unscanned(token.id).await.unwrap();
        assert!(!deleted, "scanned tokens must survive teardown");
        assert!(
            redemption_token::find_by_id(&h.pool, token.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
