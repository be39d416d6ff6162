//! Change-notification contract
//!
//! The consumer controller never polls: after every committed row mutation
//! the data-owning side publishes a [`ChangeEvent`] carrying the full new
//! (and, for updates/deletes, old) row as JSON. Subscribers filter by table,
//! an optional column-equality [`RowFilter`], and an [`EventMask`].
//!
//! Delivery guarantees are deliberately weak: per-row delivery of the
//! *current* state after each commit. Duplicates, reordering and gaps (a
//! lagged subscriber) are all possible, so handlers must re-evaluate the
//! full row they receive rather than diff against a remembered one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Table names carried on events (the de facto schema contract)
pub const TABLE_PURCHASE_TOKENS: &str = "purchase_tokens";
pub const TABLE_REDEMPTION_TOKENS: &str = "redemption_tokens";

/// Kind of row mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed row mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// Row state after the mutation (absent for deletes)
    pub new: Option<Value>,
    /// Row state before the mutation (absent for inserts)
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert<T: Serialize>(table: &str, new: &T) -> Self {
        Self {
            table: table.to_string(),
            kind: ChangeKind::Insert,
            new: serde_json::to_value(new).ok(),
            old: None,
        }
    }

    pub fn update<T: Serialize>(table: &str, old: Option<&T>, new: &T) -> Self {
        Self {
            table: table.to_string(),
            kind: ChangeKind::Update,
            new: serde_json::to_value(new).ok(),
            old: old.and_then(|o| serde_json::to_value(o).ok()),
        }
    }

    pub fn delete<T: Serialize>(table: &str, old: &T) -> Self {
        Self {
            table: table.to_string(),
            kind: ChangeKind::Delete,
            new: None,
            old: serde_json::to_value(old).ok(),
        }
    }

    /// Integer column value from the new row, falling back to the old row
    pub fn column_i64(&self, column: &str) -> Option<i64> {
        self.new
            .as_ref()
            .or(self.old.as_ref())?
            .get(column)?
            .as_i64()
    }

    /// Decode the new row into a typed model
    pub fn decode_new<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        let value = self.new.clone()?;
        serde_json::from_value(value).ok()
    }
}

/// Which event kinds a subscription receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl EventMask {
    pub const ALL: Self = Self {
        insert: true,
        update: true,
        delete: true,
    };

    pub const UPDATE: Self = Self {
        insert: false,
        update: true,
        delete: false,
    };

    pub fn matches(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Insert => self.insert,
            ChangeKind::Update => self.update,
            ChangeKind::Delete => self.delete,
        }
    }
}

/// Column-equality row filter, e.g. `id = 42` or `purchase_token_id = 42`
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub column: String,
    pub value: i64,
}

impl RowFilter {
    pub fn id(value: i64) -> Self {
        Self {
            column: "id".into(),
            value,
        }
    }

    pub fn purchase_token(value: i64) -> Self {
        Self {
            column: "purchase_token_id".into(),
            value,
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.column_i64(&self.column) == Some(self.value)
    }
}

/// Errors establishing a subscription
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("change feed unavailable: {0}")]
    Unavailable(String),
}

/// A live subscription handle.
///
/// Dropping the handle (or calling [`close`](Self::close), which is
/// idempotent) unsubscribes; the publishing side notices on its next send.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: mpsc::Receiver<ChangeEvent>,
    closed: bool,
}

impl FeedSubscription {
    pub fn new(rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { rx, closed: false }
    }

    /// Next matching event, or `None` once the feed or subscription closed
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop receiving. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            self.rx.close();
            self.closed = true;
        }
    }
}

/// The subscription entry point both orchestrators are written against
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(
        &self,
        table: &str,
        filter: Option<RowFilter>,
        mask: EventMask,
    ) -> Result<FeedSubscription, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: i64,
        purchase_token_id: i64,
        status: &'static str,
    }

    #[test]
    fn row_filter_matches_on_new_then_old() {
        let row = Row {
            id: 7,
            purchase_token_id: 99,
            status: "Pending",
        };
        let ev = ChangeEvent::insert(TABLE_REDEMPTION_TOKENS, &row);
        assert!(RowFilter::id(7).matches(&ev));
        assert!(RowFilter::purchase_token(99).matches(&ev));
        assert!(!RowFilter::id(8).matches(&ev));

        let del = ChangeEvent::delete(TABLE_REDEMPTION_TOKENS, &row);
        assert!(RowFilter::id(7).matches(&del), "delete events match on old row");
    }

    #[test]
    fn event_mask_selects_kinds() {
        assert!(EventMask::ALL.matches(ChangeKind::Delete));
        assert!(EventMask::UPDATE.matches(ChangeKind::Update));
        assert!(!EventMask::UPDATE.matches(ChangeKind::Insert));
    }

    #[tokio::test]
    async fn subscription_close_is_idempotent() {
        let (tx, rx) = mpsc::channel(4);
        let mut sub = FeedSubscription::new(rx);
        drop(tx);
        sub.close();
        sub.close();
        assert!(sub.recv().await.is_none());
    }
}
