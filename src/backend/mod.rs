//! Livemark backend layer.
//!
//! The hosted platform (authentication, persistence, authorization, change
//! notification) is abstracted behind the [`BackendClient`] trait so the app
//! core can be wired against either the real HTTP client or the in-process
//! backend used by tests and the demo binary.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use livemark::backend::{BackendClient, memory::MemoryBackend};
//!
//! let backend: Arc<dyn BackendClient> = Arc::new(MemoryBackend::new());
//! let feed = backend.subscribe_changes("user-1");
//! // `feed.guard` closes the subscription when dropped.
//! ```

pub mod http;
pub mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::bookmark::Bookmark;
use crate::types::errors::{AuthError, QueryError, WriteError};
use crate::types::event::ChangeEvent;
use crate::types::identity::{AuthEvent, Identity};

/// Releases one feed registration when dropped.
///
/// Both the auth feed and the per-identity change feed hand one of these out
/// on subscribe; holding the guard keeps the feed open, dropping it (or
/// calling [`close`](SubscriptionGuard::close)) releases the registration.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Releases the registration now instead of at drop time.
    pub fn close(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("open", &self.release.is_some())
            .finish()
    }
}

/// Session-transition events for the process lifetime, plus the guard that
/// unregisters the listener.
#[derive(Debug)]
pub struct AuthFeed {
    pub events: UnboundedReceiver<AuthEvent>,
    pub guard: SubscriptionGuard,
}

/// One open live-change feed, scoped to a single identity's record set.
#[derive(Debug)]
pub struct ChangeFeed {
    pub events: UnboundedReceiver<ChangeEvent>,
    pub guard: SubscriptionGuard,
}

/// The backend collaborator: an opaque capability provider for
/// authentication, owner-scoped record access, and change notification.
///
/// Every record operation repeats the explicit owner filter even though the
/// backend enforces ownership itself.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Queries the current session's identity once. `Ok(None)` means no
    /// authenticated session.
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError>;

    /// Registers for session-state transitions.
    fn subscribe_auth(&self) -> AuthFeed;

    /// Starts a sign-in through the configured OAuth provider. The resulting
    /// session lands as a [`AuthEvent::SignedIn`] on the auth feed.
    async fn sign_in(&self) -> Result<(), AuthError>;

    /// Ends the current session. Emits [`AuthEvent::SignedOut`].
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Fetches all records owned by `owner_id`, ordered by creation time
    /// descending.
    async fn fetch_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, QueryError>;

    /// Inserts a record owned by `owner_id`. The backend assigns id and
    /// creation time; the resulting insert event arrives on the change feed.
    async fn insert_bookmark(
        &self,
        owner_id: &str,
        url: &str,
        title: &str,
    ) -> Result<(), WriteError>;

    /// Deletes the record matching both `id` and `owner_id`.
    async fn delete_bookmark(&self, id: &str, owner_id: &str) -> Result<(), WriteError>;

    /// Opens a live feed of insert/update/delete events for `owner_id`'s
    /// records. Events are delivered in arrival order, unbuffered.
    fn subscribe_changes(&self, owner_id: &str) -> ChangeFeed;
}
