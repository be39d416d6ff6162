//! Consumer-core error types

use shared::changefeed::FeedError;
use shared::models::CancelBlocked;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("cannot cancel: {0}")]
    CancelBlocked(#[from] CancelBlocked),
}

pub type ClientResult<T> = Result<T, ClientError>;
