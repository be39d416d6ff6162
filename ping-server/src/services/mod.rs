//! Services
//!
//! - [`notifier`] - fire-and-forget push/email/in-app dispatch

pub mod notifier;

pub use notifier::NotifierService;
