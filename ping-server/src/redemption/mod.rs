//! Redemption State Machine
//!
//! Owns every legal transition of a redemption token and the side effects
//! each transition triggers on the purchase token, the user's loyalty
//! balance and the change feed:
//!
//! ```text
//! Pending ──scan──► In Progress ──complete(pay-on-the-day)──► Submitted ──confirm──► Finished
//!                        │                                       │   ▲
//!                        │                                    dispute │ resubmit
//!                        │                                       ▼   │
//!                        │                                     Rejected
//!                        └──complete(pay-up-front)───────────────────► Finished
//! ```
//!
//! Transitions are triggered from two independent devices with no shared
//! lock; every mutation is a conditional update so the loser of a race gets
//! a distinguishable error instead of corrupting state.

mod error;
mod service;

pub use error::RedemptionError;
pub use service::RedemptionService;
