//! Change Feed Hub
//!
//! The only cross-process signal in the redemption flow: after every
//! committed row mutation the owning service publishes a [`ChangeEvent`]
//! here, and consumer-side controllers subscribe with a table name, an
//! optional row filter and an event mask.
//!
//! ```text
//! RedemptionService / CancellationService (publish after commit)
//!        │
//!        └── broadcast ──► per-subscription forwarder ──► mpsc ──► FeedSubscription
//! ```
//!
//! Filtering happens on the receive side so the hub stays a single fan-out
//! channel. A lagged subscriber logs and picks up with the next event; that
//! is safe because subscribers re-evaluate the full row they receive rather
//! than diffing against history.

use async_trait::async_trait;
use shared::changefeed::{
    ChangeEvent, ChangeFeed, EventMask, FeedError, FeedSubscription, RowFilter,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Hub capacity; sized well past the burst a single venue can produce
const CHANNEL_CAPACITY: usize = 4096;

/// Per-subscription buffer between the forwarder and the consumer
const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Clone, Debug)]
pub struct ChangeFeedService {
    tx: broadcast::Sender<Arc<ChangeEvent>>,
}

impl Default for ChangeFeedService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeedService {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a committed mutation. Having no subscribers is normal.
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.tx.receiver_count();
        tracing::debug!(
            table = %event.table,
            kind = ?event.kind,
            receivers,
            "Publishing change event"
        );
        let _ = self.tx.send(Arc::new(event));
    }
}

#[async_trait]
impl ChangeFeed for ChangeFeedService {
    async fn subscribe(
        &self,
        table: &str,
        filter: Option<RowFilter>,
        mask: EventMask,
    ) -> Result<FeedSubscription, FeedError> {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let table = table.to_string();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if event.table != table
                            || !mask.matches(event.kind)
                            || !filter.as_ref().is_none_or(|f| f.matches(&event))
                        {
                            continue;
                        }
                        if out_tx.send((*event).clone()).await.is_err() {
                            // Subscriber dropped its handle — unsubscribe.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            table = %table,
                            skipped,
                            "Change feed subscriber lagged; continuing with current state"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(FeedSubscription::new(out_rx))
    }
}
