//! In-process backend for tests and the demo binary.
//!
//! Implements [`BackendClient`] over plain in-memory state, the way the
//! real platform would behave for a single project: a user directory, one
//! session slot, an append-only row store with server-assigned ids and
//! creation times, and auth/change subscribers. The owner-match
//! authorization boundary is enforced here too, so tests exercise the same
//! denial paths the hosted backend produces.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::backend::{AuthFeed, BackendClient, ChangeFeed, SubscriptionGuard};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{AuthError, QueryError, WriteError};
use crate::types::event::ChangeEvent;
use crate::types::identity::{AuthEvent, Identity};

/// Base for the deterministic `created_at` sequence (unix ms).
const CREATED_AT_BASE: i64 = 1_700_000_000_000;

struct ChangeFeedEntry {
    id: u64,
    owner_id: String,
    tx: UnboundedSender<ChangeEvent>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<Identity>,
    session: Option<Identity>,
    rows: Vec<Bookmark>,
    next_seq: i64,
    next_feed_id: u64,
    auth_feeds: Vec<(u64, UnboundedSender<AuthEvent>)>,
    change_feeds: Vec<ChangeFeedEntry>,
    fail_auth: bool,
    fail_queries: bool,
    fail_writes: bool,
}

impl MemoryState {
    fn next_created_at(&mut self) -> i64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        CREATED_AT_BASE + seq * 1_000
    }

    fn broadcast_auth(&mut self, event: AuthEvent) {
        self.auth_feeds.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    fn broadcast_change(&mut self, owner_id: &str, event: ChangeEvent) {
        self.change_feeds
            .retain(|entry| entry.owner_id != owner_id || entry.tx.send(event.clone()).is_ok());
    }

    fn session_matches(&self, owner_id: &str) -> bool {
        matches!(&self.session, Some(identity) if identity.id == owner_id)
    }
}

/// In-memory [`BackendClient`] implementation.
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory backend state poisoned")
    }

    /// Adds a user to the directory. The first registered user is the one
    /// [`sign_in`](BackendClient::sign_in) signs in.
    pub fn register_user(&self, id: &str, email: &str) -> Identity {
        let identity = Identity {
            id: id.to_string(),
            email: email.to_string(),
        };
        self.lock().users.push(identity.clone());
        identity
    }

    /// Signs in a specific registered user and emits the transition.
    pub fn sign_in_as(&self, user_id: &str) -> Result<Identity, AuthError> {
        let mut state = self.lock();
        let identity = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| AuthError::SignInFailed(format!("unknown user: {}", user_id)))?;
        state.session = Some(identity.clone());
        state.broadcast_auth(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Emits a token-refresh transition for the current session, if any.
    pub fn refresh_session(&self) {
        let mut state = self.lock();
        if let Some(identity) = state.session.clone() {
            state.broadcast_auth(AuthEvent::TokenRefreshed(identity));
        }
    }

    /// Inserts a row without emitting a change event — pre-existing data a
    /// snapshot fetch should find.
    pub fn seed_bookmark(&self, owner_id: &str, url: &str, title: &str) -> Bookmark {
        let mut state = self.lock();
        let created_at = state.next_created_at();
        let record = Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            created_at,
        };
        state.rows.push(record.clone());
        record
    }

    /// Inserts a row and emits the insert event, as if another of the
    /// owner's sessions created it.
    pub fn remote_insert(&self, owner_id: &str, url: &str, title: &str) -> Bookmark {
        let mut state = self.lock();
        let created_at = state.next_created_at();
        let record = Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            created_at,
        };
        state.rows.push(record.clone());
        let owner = record.owner_id.clone();
        state.broadcast_change(&owner, ChangeEvent::insert(record.clone()));
        record
    }

    /// Rewrites a row in place and emits the update event.
    pub fn remote_update(&self, id: &str, url: &str, title: &str) -> Option<Bookmark> {
        let mut state = self.lock();
        let pos = state.rows.iter().position(|r| r.id == id)?;
        state.rows[pos].url = url.to_string();
        state.rows[pos].title = title.to_string();
        let record = state.rows[pos].clone();
        let owner = record.owner_id.clone();
        state.broadcast_change(&owner, ChangeEvent::update(record.clone()));
        Some(record)
    }

    /// Removes a row and emits the delete event.
    pub fn remote_delete(&self, id: &str) -> Option<Bookmark> {
        let mut state = self.lock();
        let pos = state.rows.iter().position(|r| r.id == id)?;
        let record = state.rows.remove(pos);
        let owner = record.owner_id.clone();
        state.broadcast_change(&owner, ChangeEvent::delete(record.clone()));
        Some(record)
    }

    /// Rows currently stored for `owner_id`, newest first.
    pub fn stored(&self, owner_id: &str) -> Vec<Bookmark> {
        let state = self.lock();
        let mut rows: Vec<Bookmark> = state
            .rows
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn set_fail_auth(&self, fail: bool) {
        self.lock().fail_auth = fail;
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.lock().fail_queries = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of open change feeds, across all owners.
    pub fn open_change_feeds(&self) -> usize {
        self.lock().change_feeds.len()
    }

    /// Number of registered auth listeners.
    pub fn open_auth_feeds(&self) -> usize {
        self.lock().auth_feeds.len()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        let state = self.lock();
        if state.fail_auth {
            return Err(AuthError::SessionUnavailable(
                "auth service unreachable".to_string(),
            ));
        }
        Ok(state.session.clone())
    }

    fn subscribe_auth(&self) -> AuthFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_feed_id;
        state.next_feed_id += 1;
        state.auth_feeds.push((id, tx));
        let shared = Arc::clone(&self.state);
        AuthFeed {
            events: rx,
            guard: SubscriptionGuard::new(move || {
                if let Ok(mut state) = shared.lock() {
                    state.auth_feeds.retain(|(fid, _)| *fid != id);
                }
            }),
        }
    }

    async fn sign_in(&self) -> Result<(), AuthError> {
        let mut state = self.lock();
        if state.fail_auth {
            return Err(AuthError::SignInFailed("provider unreachable".to_string()));
        }
        let identity = state
            .users
            .first()
            .cloned()
            .ok_or_else(|| AuthError::SignInFailed("no user provisioned".to_string()))?;
        state.session = Some(identity.clone());
        state.broadcast_auth(AuthEvent::SignedIn(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut state = self.lock();
        if state.fail_auth {
            return Err(AuthError::SignOutFailed("auth service unreachable".to_string()));
        }
        state.session = None;
        state.broadcast_auth(AuthEvent::SignedOut);
        Ok(())
    }

    async fn fetch_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, QueryError> {
        let state = self.lock();
        if state.fail_queries {
            return Err(QueryError::Backend("query failed".to_string()));
        }
        if !state.session_matches(owner_id) {
            return Err(QueryError::Backend(format!(
                "permission denied for owner {}",
                owner_id
            )));
        }
        let mut rows: Vec<Bookmark> = state
            .rows
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_bookmark(
        &self,
        owner_id: &str,
        url: &str,
        title: &str,
    ) -> Result<(), WriteError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(WriteError::Backend("write failed".to_string()));
        }
        if !state.session_matches(owner_id) {
            return Err(WriteError::Denied(format!(
                "row ownership violation for owner {}",
                owner_id
            )));
        }
        let created_at = state.next_created_at();
        let record = Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            created_at,
        };
        state.rows.push(record.clone());
        debug!(id = %record.id, owner = %owner_id, "inserted bookmark");
        state.broadcast_change(owner_id, ChangeEvent::insert(record));
        Ok(())
    }

    async fn delete_bookmark(&self, id: &str, owner_id: &str) -> Result<(), WriteError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(WriteError::Backend("write failed".to_string()));
        }
        if !state.session_matches(owner_id) {
            return Err(WriteError::Denied(format!(
                "row ownership violation for owner {}",
                owner_id
            )));
        }
        // Constrained by both id and owner; a non-matching filter deletes
        // zero rows, which is not an error.
        let pos = state
            .rows
            .iter()
            .position(|r| r.id == id && r.owner_id == owner_id);
        if let Some(pos) = pos {
            let record = state.rows.remove(pos);
            debug!(id = %record.id, owner = %owner_id, "deleted bookmark");
            state.broadcast_change(owner_id, ChangeEvent::delete(record));
        }
        Ok(())
    }

    fn subscribe_changes(&self, owner_id: &str) -> ChangeFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_feed_id;
        state.next_feed_id += 1;
        state.change_feeds.push(ChangeFeedEntry {
            id,
            owner_id: owner_id.to_string(),
            tx,
        });
        let shared = Arc::clone(&self.state);
        ChangeFeed {
            events: rx,
            guard: SubscriptionGuard::new(move || {
                if let Ok(mut state) = shared.lock() {
                    state.change_feeds.retain(|entry| entry.id != id);
                }
            }),
        }
    }
}
