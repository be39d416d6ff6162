//! Ping Local Server - redemption core for the local-offers platform
//!
//! # Architecture overview
//!
//! - **Change feed** (`changefeed`): in-process change-notification hub,
//!   the only signal the consumer controller reacts to
//! - **Database** (`db`): SQLite pool and per-table repositories
//! - **Redemption** (`redemption`): the token state machine
//! - **Cancellation** (`cancellation`): claim cancellation with inventory
//!   rollback
//! - **HTTP API** (`api`): RESTful interface for both client applications
//!
//! # Module structure
//!
//! ```text
//! ping-server/src/
//! ├── core/          # configuration, state, server
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # database layer
//! ├── changefeed/    # change-notification hub
//! ├── redemption/    # redemption state machine
//! ├── cancellation/  # claim cancellation
//! ├── services/      # notification dispatch
//! └── utils/         # error envelope, logging
//! ```

pub mod api;
pub mod cancellation;
pub mod changefeed;
pub mod core;
pub mod db;
pub mod redemption;
pub mod services;
pub mod utils;

// Re-export common types
pub use cancellation::{CancellationError, CancellationService};
pub use changefeed::ChangeFeedService;
pub use crate::core::{Config, Server, ServerState};
pub use db::DbService;
pub use redemption::{RedemptionError, RedemptionService};
pub use services::NotifierService;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let level = std::env::var("LOG_LEVEL").ok();
    let dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(level.as_deref(), dir.as_deref());
}
