//! Claim Presentation Controller
//!
//! One instance per open QR screen. On open it ensures exactly one fresh
//! unscanned redemption token exists for the purchase (unless the purchase
//! already finished), subscribes to the change feed, and turns every
//! received row into a navigation decision. On close it unsubscribes and
//! deletes the token it created — guarded by `scanned = false`, so a scan
//! racing the teardown keeps the row alive.
//!
//! The QR code itself renders the *purchase* token id, so token creation
//! failing is logged and degrades gracefully: the screen still works, staff
//! just see "customer hasn't opened their QR" until a retry.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared::changefeed::{
    ChangeEvent, ChangeFeed, ChangeKind, EventMask, RowFilter, TABLE_PURCHASE_TOKENS,
    TABLE_REDEMPTION_TOKENS,
};
use shared::models::{PurchaseToken, RedemptionToken};

use crate::navigator::{Navigator, decide_navigation};
use crate::store::{ClaimStore, StoreError};

pub struct ClaimPresentationController<S, N>
where
    S: ClaimStore + 'static,
    N: Navigator + 'static,
{
    store: Arc<S>,
    navigator: Arc<N>,
    purchase: PurchaseToken,
    /// Token created by this instance; cleared once handed to teardown
    created_token_id: Mutex<Option<i64>>,
    /// Set as soon as any received row shows `scanned = true`
    scanned_seen: AtomicBool,
    closing: CancellationToken,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S, N> ClaimPresentationController<S, N>
where
    S: ClaimStore + 'static,
    N: Navigator + 'static,
{
    /// Open the controller for a not-yet-cancelled purchase.
    ///
    /// Entry sequence: finished-token check → idempotent cleanup + fresh
    /// insert (one store operation) → subscribe → react.
    pub async fn open<F>(
        store: Arc<S>,
        feed: Arc<F>,
        navigator: Arc<N>,
        purchase: PurchaseToken,
    ) -> Arc<Self>
    where
        F: ChangeFeed + 'static,
    {
        let controller = Arc::new(Self {
            store,
            navigator,
            purchase,
            created_token_id: Mutex::new(None),
            scanned_seen: AtomicBool::new(false),
            closing: CancellationToken::new(),
            event_task: Mutex::new(None),
        });

        match controller
            .store
            .find_finished_token(controller.purchase.id)
            .await
        {
            Ok(Some(existing)) => {
                // Already redeemed: nothing to create, navigate from the
                // record that exists.
                info!(
                    purchase_token_id = controller.purchase.id,
                    token_id = existing.id,
                    "Purchase already redeemed; skipping token creation"
                );
                if existing.scanned {
                    controller.scanned_seen.store(true, Ordering::Relaxed);
                }
                if let Some(target) = decide_navigation(&existing) {
                    controller.navigator.replace(target);
                }
            }
            Ok(None) => {
                if let Err(e) = controller.create_fresh_token().await {
                    // Graceful degradation: the QR renders the purchase id
                    // regardless of whether this insert landed.
                    warn!(
                        purchase_token_id = controller.purchase.id,
                        error = %e,
                        "Redemption token creation failed; QR screen continues"
                    );
                }
            }
            Err(e) => {
                warn!(
                    purchase_token_id = controller.purchase.id,
                    error = %e,
                    "Finished-token lookup failed; QR screen continues"
                );
            }
        }

        Arc::clone(&controller).spawn_event_loop(feed).await;
        controller
    }

    async fn create_fresh_token(&self) -> Result<(), StoreError> {
        if self.closing.is_cancelled() {
            // Torn down before we got to the insert: create nothing.
            return Ok(());
        }
        let token = self.store.create_token(&self.purchase).await?;
        if self.closing.is_cancelled() {
            // Torn down while the insert was in flight. Remove it, guarded
            // by `scanned = false` in case a scan already raced us.
            match self.store.delete_token_if_unscanned(token.id).await {
                Ok(deleted) => debug!(token_id = token.id, deleted, "Cleaned up mid-teardown insert"),
                Err(e) => warn!(token_id = token.id, error = %e, "Mid-teardown cleanup failed"),
            }
            return Ok(());
        }
        debug!(token_id = token.id, "Created redemption token");
        *self.created_token_id.lock().unwrap() = Some(token.id);
        Ok(())
    }

    async fn spawn_event_loop<F>(self: Arc<Self>, feed: Arc<F>)
    where
        F: ChangeFeed + 'static,
    {
        let purchase_id = self.purchase.id;
        let purchase_sub = feed
            .subscribe(
                TABLE_PURCHASE_TOKENS,
                Some(RowFilter::id(purchase_id)),
                EventMask::UPDATE,
            )
            .await;
        let token_sub = feed
            .subscribe(
                TABLE_REDEMPTION_TOKENS,
                Some(RowFilter::purchase_token(purchase_id)),
                EventMask::ALL,
            )
            .await;

        let (mut purchase_sub, mut token_sub) = match (purchase_sub, token_sub) {
            (Ok(p), Ok(t)) => (p, t),
            (p, t) => {
                warn!(purchase_token_id = purchase_id, "Change feed subscription failed");
                if let Ok(mut sub) = p {
                    sub.close();
                }
                if let Ok(mut sub) = t {
                    sub.close();
                }
                return;
            }
        };

        let this = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.closing.cancelled() => break,
                    event = token_sub.recv() => match event {
                        Some(event) => this.handle_token_event(&event).await,
                        None => break,
                    },
                    event = purchase_sub.recv() => match event {
                        Some(event) => this.handle_purchase_event(&event).await,
                        None => break,
                    },
                }
            }
            // Exactly one unsubscribe per subscribe.
            purchase_sub.close();
            token_sub.close();
        });
        *self.event_task.lock().unwrap() = Some(handle);
    }

    /// React to a redemption-token row. Handlers re-evaluate the full row,
    /// so duplicates and reordering from the feed are harmless.
    async fn handle_token_event(&self, event: &ChangeEvent) {
        if event.kind == ChangeKind::Delete {
            return;
        }
        let Some(token) = event.decode_new::<RedemptionToken>() else {
            return;
        };
        if token.scanned {
            self.scanned_seen.store(true, Ordering::Relaxed);
        }
        if let Some(target) = decide_navigation(&token) {
            debug!(token_id = token.id, status = %token.status, ?target, "Navigating");
            self.navigator.replace(target);
        }
    }

    /// React to the purchase row flipping to redeemed (the business side
    /// finished without us seeing the token update — e.g. a reconnect).
    async fn handle_purchase_event(&self, event: &ChangeEvent) {
        let Some(purchase) = event.decode_new::<PurchaseToken>() else {
            return;
        };
        if !purchase.redeemed {
            return;
        }
        match self.store.find_finished_token(purchase.id).await {
            Ok(Some(token)) => {
                if token.scanned {
                    self.scanned_seen.store(true, Ordering::Relaxed);
                }
                if let Some(target) = decide_navigation(&token) {
                    self.navigator.replace(target);
                }
            }
            Ok(None) => {
                debug!(purchase_token_id = purchase.id, "Redeemed purchase with no finished token yet");
            }
            Err(e) => {
                warn!(purchase_token_id = purchase.id, error = %e, "Finished-token fetch failed");
            }
        }
    }

    /// Teardown: unsubscribe and delete the token this instance created,
    /// unless it was scanned in the meantime.
    pub async fn close(&self) {
        self.closing.cancel();
        let task = self.event_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        if self.scanned_seen.load(Ordering::Relaxed) {
            // Scanned tokens must remain for the business side.
            self.created_token_id.lock().unwrap().take();
            return;
        }
        let created = self.created_token_id.lock().unwrap().take();
        if let Some(token_id) = created {
            match self.store.delete_token_if_unscanned(token_id).await {
                Ok(true) => debug!(token_id, "Deleted unused redemption token"),
                Ok(false) => debug!(token_id, "Token survived teardown (scanned)"),
                Err(e) => warn!(token_id, error = %e, "Teardown delete failed"),
            }
        }
    }

    /// The id this controller created, if any (teardown bookkeeping)
    pub fn created_token_id(&self) -> Option<i64> {
        *self.created_token_id.lock().unwrap()
    }
}
