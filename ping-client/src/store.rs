//! Data-access seam
//!
//! The subset of platform operations the consumer device performs, as the
//! controller and flows see them. Every operation is fallible with a
//! structured error; precondition rejections are distinguishable from
//! transport failures so the UI can show a retry for one and not the other.

use async_trait::async_trait;
use shared::loyalty::BillReceipt;
use shared::models::{PurchaseToken, RedemptionToken};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The server rejected the operation's precondition (double scan,
    /// already completed, outside the cancellation window, ...)
    #[error("{0}")]
    Precondition(String),

    /// The referenced row no longer exists
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or server failure; the operation may be retried by the user
    #[error("transport: {0}")]
    Transport(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// The `Finished` redemption token of a purchase, if one exists
    async fn find_finished_token(
        &self,
        purchase_token_id: i64,
    ) -> StoreResult<Option<RedemptionToken>>;

    /// Create a fresh `Pending` token for the purchase. The platform deletes
    /// any unscanned sibling first, so calling this twice leaves exactly one
    /// unscanned token.
    async fn create_token(&self, purchase: &PurchaseToken) -> StoreResult<RedemptionToken>;

    /// Teardown cleanup: delete a token only while `scanned = false`.
    /// Returns whether a row was removed.
    async fn delete_token_if_unscanned(&self, token_id: i64) -> StoreResult<bool>;

    /// Point read
    async fn get_token(&self, token_id: i64) -> StoreResult<Option<RedemptionToken>>;

    /// Customer rejects the submitted amount (`Submitted → Rejected`)
    async fn dispute_bill(&self, token_id: i64) -> StoreResult<RedemptionToken>;

    /// Customer accepts the submitted amount; finishes the redemption and
    /// credits loyalty points
    async fn confirm_bill(&self, token_id: i64, user_id: i64) -> StoreResult<BillReceipt>;

    /// Consumer-initiated cancellation of a claim
    async fn cancel_claim(&self, purchase_token_id: i64) -> StoreResult<PurchaseToken>;
}
