//! Navigation seam and the event → screen decision
//!
//! [`decide_navigation`] is the single place that maps a redemption token's
//! current state to a screen. It is evaluated on every received row, in
//! full, so duplicate and out-of-order deliveries are harmless.

use shared::models::{RedemptionToken, TokenStatus};

/// Screens the redemption flow can land on
#[derive(Debug, Clone, PartialEq)]
pub enum NavTarget {
    /// The staff submitted a bill; show it for confirmation
    BillConfirmation { amount: f64 },
    /// Staff are working the redemption; keep the consumer waiting
    Waiting,
    /// The redemption finished
    Success,
    /// The consumer disputed the amount and waits for a resubmission
    DisputeWaiting { current_amount: f64 },
}

/// Navigation seam the app implements (a stack navigator in production, a
/// recorder in tests)
pub trait Navigator: Send + Sync {
    fn replace(&self, target: NavTarget);
}

/// Map a redemption token's state to a navigation decision.
///
/// The order of the checks is load-bearing: a token can be `scanned` and
/// `Submitted` at the same time, and the submitted bill must win over the
/// generic waiting screen or the consumer never sees the amount.
pub fn decide_navigation(token: &RedemptionToken) -> Option<NavTarget> {
    if token.status == TokenStatus::Submitted
        && let Some(amount) = token.bill_input_total
    {
        return Some(NavTarget::BillConfirmation { amount });
    }
    if (token.scanned || token.status == TokenStatus::InProgress)
        && token.status != TokenStatus::Finished
    {
        return Some(NavTarget::Waiting);
    }
    if token.status == TokenStatus::Finished {
        return Some(NavTarget::Success);
    }
    None
}
