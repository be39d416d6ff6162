//! Shared types for the Ping Local platform
//!
//! This crate holds everything both sides of the redemption flow agree on:
//!
//! - **Models** (`models`): purchase tokens, redemption tokens, offers,
//!   users, the loyalty ledger and in-app notification rows. Field names are
//!   the wire contract with the business-side application and must not drift.
//! - **Loyalty math** (`loyalty`): points formula and tier bands.
//! - **Change feed** (`changefeed`): the change-notification contract the
//!   consumer controller subscribes to.
//! - **Utilities** (`util`): ID generation and timestamp helpers.

pub mod changefeed;
pub mod loyalty;
pub mod models;
pub mod util;

pub use changefeed::{ChangeEvent, ChangeFeed, ChangeKind, EventMask, FeedSubscription, RowFilter};
pub use loyalty::{BillReceipt, LoyaltyTier, points_for_bill, tier_for_points};
