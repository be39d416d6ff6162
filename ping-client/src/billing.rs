//! Bill confirmation and the dispute/resubmission loop
//!
//! Entered when a redemption token reaches `Submitted`. Confirm hands the
//! amount to the platform; failure keeps the flow on the confirmation step
//! with the error surfaced — there is no partial acceptance. Dispute parks
//! the token in `Rejected` and waits on the same token id for the staff to
//! resubmit.

use std::sync::Arc;

use tracing::{debug, info, warn};

use shared::changefeed::{ChangeFeed, EventMask, RowFilter, TABLE_REDEMPTION_TOKENS};
use shared::loyalty::BillReceipt;
use shared::models::{RedemptionToken, TokenStatus};

use crate::error::ClientResult;
use crate::navigator::{NavTarget, Navigator};
use crate::store::ClaimStore;

pub struct BillConfirmationFlow<S, F, N>
where
    S: ClaimStore,
    F: ChangeFeed,
    N: Navigator,
{
    store: Arc<S>,
    feed: Arc<F>,
    navigator: Arc<N>,
    redemption_token_id: i64,
    user_id: i64,
    /// The amount currently shown to the consumer
    amount: f64,
}

impl<S, F, N> BillConfirmationFlow<S, F, N>
where
    S: ClaimStore,
    F: ChangeFeed,
    N: Navigator,
{
    pub fn new(
        store: Arc<S>,
        feed: Arc<F>,
        navigator: Arc<N>,
        redemption_token_id: i64,
        user_id: i64,
        amount: f64,
    ) -> Self {
        Self {
            store,
            feed,
            navigator,
            redemption_token_id,
            user_id,
            amount,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Customer accepts the amount. On success the flow moves to the
    /// success screen; on failure it stays here and returns the error for
    /// the retry alert.
    pub async fn confirm(&self) -> ClientResult<BillReceipt> {
        match self
            .store
            .confirm_bill(self.redemption_token_id, self.user_id)
            .await
        {
            Ok(receipt) => {
                info!(
                    token_id = self.redemption_token_id,
                    points = receipt.points_earned,
                    "Bill confirmed"
                );
                self.navigator.replace(NavTarget::Success);
                Ok(receipt)
            }
            Err(e) => {
                warn!(token_id = self.redemption_token_id, error = %e, "Bill confirmation failed");
                Err(e.into())
            }
        }
    }

    /// Customer rejects the amount; the flow moves to the dispute-waiting
    /// screen. Call [`await_resubmission`](Self::await_resubmission) next.
    pub async fn dispute(&self) -> ClientResult<()> {
        self.store.dispute_bill(self.redemption_token_id).await?;
        info!(token_id = self.redemption_token_id, "Bill disputed");
        self.navigator.replace(NavTarget::DisputeWaiting {
            current_amount: self.amount,
        });
        Ok(())
    }

    /// Wait for the staff to act after a dispute.
    ///
    /// Routes back to bill confirmation when the token returns to
    /// `Submitted` with an amount. A changed amount is honoured as a
    /// fallback resubmission signal even without the status flip, since a
    /// staff client may not update both atomically. A `Finished` token
    /// (confirmed elsewhere) short-circuits to the success screen.
    ///
    /// Returns the resubmitted amount, or `None` when the flow ended
    /// without one (feed closed, or remote finish).
    pub async fn await_resubmission(&self) -> ClientResult<Option<f64>> {
        let mut sub = self
            .feed
            .subscribe(
                TABLE_REDEMPTION_TOKENS,
                Some(RowFilter::id(self.redemption_token_id)),
                EventMask::UPDATE,
            )
            .await?;

        while let Some(event) = sub.recv().await {
            let Some(token) = event.decode_new::<RedemptionToken>() else {
                continue;
            };

            if token.status == TokenStatus::Finished {
                sub.close();
                self.navigator.replace(NavTarget::Success);
                return Ok(None);
            }

            if token.status == TokenStatus::Submitted
                && let Some(amount) = token.bill_input_total
            {
                debug!(token_id = token.id, amount, "Staff resubmitted bill");
                sub.close();
                self.navigator.replace(NavTarget::BillConfirmation { amount });
                return Ok(Some(amount));
            }

            if let Some(amount) = token.bill_input_total
                && (amount - self.amount).abs() > f64::EPSILON
            {
                debug!(token_id = token.id, amount, "Bill amount changed without status flip");
                sub.close();
                self.navigator.replace(NavTarget::BillConfirmation { amount });
                return Ok(Some(amount));
            }
        }
        Ok(None)
    }
}
