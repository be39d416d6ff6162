//! Server State
//!
//! `ServerState` holds shared references to every service. All members are
//! cheap to clone (pools and channels are reference-counted), so the state
//! itself is passed by value into handlers.

use crate::cancellation::CancellationService;
use crate::changefeed::ChangeFeedService;
use crate::core::Config;
use crate::db::DbService;
use crate::redemption::RedemptionService;
use crate::services::NotifierService;
use crate::utils::AppError;
use sqlx::SqlitePool;

/// Shared application state
///
/// | Field | Description |
/// |-------|-------------|
/// | config | immutable configuration |
/// | db | SQLite pool |
/// | changefeed | change-notification hub |
/// | notifier | fire-and-forget push/email/in-app dispatch |
/// | redemption | redemption state machine |
/// | cancellation | claim cancellation |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub changefeed: ChangeFeedService,
    pub notifier: NotifierService,
    pub redemption: RedemptionService,
    pub cancellation: CancellationService,
}

impl ServerState {
    /// Open the database and wire every service together
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        let changefeed = ChangeFeedService::new();
        let notifier = NotifierService::new(
            db.pool.clone(),
            config.push_endpoint.clone(),
            config.email_endpoint.clone(),
        );
        let redemption =
            RedemptionService::new(db.pool.clone(), changefeed.clone(), notifier.clone());
        let cancellation =
            CancellationService::new(db.pool.clone(), changefeed.clone(), notifier.clone());

        Ok(Self {
            config: config.clone(),
            db,
            changefeed,
            notifier,
            redemption,
            cancellation,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
