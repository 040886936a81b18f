//! Identity session tracking.
//!
//! Owns the single `Option<Identity>` the rest of the client reads. The
//! identity is queried once at startup; afterwards it changes only through
//! [`SessionManager::apply`], driven by the backend's auth feed. The feed
//! registration guard is held here and released on shutdown.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{BackendClient, SubscriptionGuard};
use crate::types::errors::AuthError;
use crate::types::identity::{AuthEvent, Identity};

/// What an auth event meant for this session, from the app's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// A user signed in where there was none.
    SignedIn(Identity),
    /// The authenticated user changed without an intervening sign-out.
    Switched(Identity),
    /// Token renewed for the already-current user; no resync needed.
    Refreshed,
    /// The session ended. Downstream per-identity state must be cleared as
    /// an explicit command bound to this transition, so a live event landing
    /// in the gap before the next render cannot repopulate a stale
    /// collection.
    SignedOut,
}

/// Trait defining the session tracker interface.
pub trait SessionManagerTrait {
    fn identity(&self) -> Option<&Identity>;
    fn is_signed_in(&self) -> bool;
    /// Applies one auth-feed event to the owned identity.
    fn apply(&mut self, event: AuthEvent) -> SessionTransition;
    /// Releases the auth-feed registration.
    fn close(&mut self);
}

/// Session tracker backed by the injected backend client.
pub struct SessionManager {
    backend: Arc<dyn BackendClient>,
    identity: Option<Identity>,
    registration: Option<SubscriptionGuard>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            identity: None,
            registration: None,
        }
    }

    /// Holds the auth-feed guard for the process lifetime; dropped in
    /// [`close`](SessionManagerTrait::close).
    pub fn attach_registration(&mut self, guard: SubscriptionGuard) {
        self.registration = Some(guard);
    }

    /// Queries the backend once for the current session's identity.
    ///
    /// On failure the identity stays `None` (treated as unauthenticated, no
    /// automatic retry) and the error is returned for the caller to surface.
    pub async fn initialize(&mut self) -> Result<Option<Identity>, AuthError> {
        match self.backend.current_identity().await {
            Ok(identity) => {
                if let Some(identity) = &identity {
                    info!(user = %identity.id, "session restored");
                }
                self.identity = identity.clone();
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "initial identity query failed");
                self.identity = None;
                Err(e)
            }
        }
    }
}

impl SessionManagerTrait for SessionManager {
    fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    fn apply(&mut self, event: AuthEvent) -> SessionTransition {
        match event {
            AuthEvent::SignedIn(identity) | AuthEvent::TokenRefreshed(identity) => {
                match &self.identity {
                    Some(current) if current.id == identity.id => {
                        self.identity = Some(identity);
                        SessionTransition::Refreshed
                    }
                    Some(_) => {
                        info!(user = %identity.id, "identity switched");
                        self.identity = Some(identity.clone());
                        SessionTransition::Switched(identity)
                    }
                    None => {
                        info!(user = %identity.id, "signed in");
                        self.identity = Some(identity.clone());
                        SessionTransition::SignedIn(identity)
                    }
                }
            }
            AuthEvent::SignedOut => {
                info!("signed out");
                self.identity = None;
                SessionTransition::SignedOut
            }
        }
    }

    fn close(&mut self) {
        self.registration = None;
    }
}
