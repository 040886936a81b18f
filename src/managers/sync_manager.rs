//! Snapshot loading and live-change subscription, per identity.
//!
//! One sync generation ("epoch") corresponds to one identity's lifetime in
//! this client. Starting a new generation closes the previous change feed
//! before the new one opens and invalidates every in-flight result tagged
//! with an older epoch — that is the whole stale-response story: snapshot
//! fetches are never cancelled mid-flight, their results are discarded on
//! arrival if the epoch moved on.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::backend::{BackendClient, SubscriptionGuard};
use crate::types::event::AppEvent;

/// Trait defining the sync lifecycle interface.
pub trait SyncManagerTrait {
    /// Starts a sync generation for `owner_id`: opens the change feed,
    /// spawns the snapshot fetch, and returns the new epoch.
    fn start(&mut self, owner_id: &str, events: &UnboundedSender<AppEvent>) -> u64;
    /// Closes the active feed and invalidates the current epoch.
    fn stop(&mut self);
    /// Whether `epoch` is still the live generation.
    fn is_current(&self, epoch: u64) -> bool;
    /// Whether a change feed is currently open.
    fn is_active(&self) -> bool;
}

/// Sync lifecycle manager backed by the injected backend client.
pub struct SyncManager {
    backend: Arc<dyn BackendClient>,
    epoch: u64,
    feed: Option<SubscriptionGuard>,
}

impl SyncManager {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            epoch: 0,
            feed: None,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl SyncManagerTrait for SyncManager {
    fn start(&mut self, owner_id: &str, events: &UnboundedSender<AppEvent>) -> u64 {
        // Close the previous identity's feed before the new one opens.
        self.feed = None;
        self.epoch += 1;
        let epoch = self.epoch;
        info!(owner = %owner_id, epoch, "starting sync");

        let feed = self.backend.subscribe_changes(owner_id);
        self.feed = Some(feed.guard);

        // Forward live events in arrival order, tagged with this epoch. The
        // task ends when the feed closes or the app loop goes away.
        let tx = events.clone();
        let mut rx = feed.events;
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if tx.send(AppEvent::Change { epoch, event }).is_err() {
                    break;
                }
            }
        });

        // Snapshot fetch: the authoritative baseline for this generation.
        let backend = Arc::clone(&self.backend);
        let owner = owner_id.to_string();
        let tx = events.clone();
        tokio::spawn(async move {
            let result = backend.fetch_bookmarks(&owner).await;
            let _ = tx.send(AppEvent::Snapshot { epoch, result });
        });

        epoch
    }

    fn stop(&mut self) {
        if self.feed.take().is_some() {
            debug!(epoch = self.epoch, "closed change feed");
        }
        self.epoch += 1;
    }

    fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    fn is_active(&self) -> bool {
        self.feed.is_some()
    }
}
