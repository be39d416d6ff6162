//! Ping Local consumer core
//!
//! The device-side half of the redemption flow. No UI lives here; this
//! crate owns the behaviour behind the screens:
//!
//! - [`controller`] - the claim presentation controller: one instance per
//!   open QR screen, creating the redemption token lazily, deleting it if
//!   abandoned, and turning change-feed events into navigation decisions
//! - [`billing`] - bill confirmation and the dispute/resubmission loop
//! - [`cancellation`] - consumer-initiated claim cancellation
//! - [`store`] / [`reminders`] / [`navigator`] - the seams the app wires
//!   up: data access, the device-local reminder scheduler, and navigation
//! - [`http`] - `ClaimStore` over the platform HTTP API
//!
//! Everything is generic over those seams so the flows run unchanged
//! against the production API or an in-process server in tests.

pub mod billing;
pub mod cancellation;
pub mod controller;
pub mod error;
pub mod http;
pub mod navigator;
pub mod reminders;
pub mod store;

pub use billing::BillConfirmationFlow;
pub use cancellation::cancel_claim;
pub use controller::ClaimPresentationController;
pub use error::{ClientError, ClientResult};
pub use http::HttpClaimStore;
pub use navigator::{NavTarget, Navigator, decide_navigation};
pub use reminders::{ReminderError, ReminderScheduler, schedule_booking_reminder};
pub use store::{ClaimStore, StoreError};
