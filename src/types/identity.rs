use serde::{Deserialize, Serialize};

/// The authenticated user behind the current session.
///
/// `id` is the stable unique identifier the backend scopes all bookmark
/// records by; `email` is the display attribute shown in the interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// A session-state transition delivered by the backend's auth feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in (or the backend reported an existing session).
    SignedIn(Identity),
    /// The session ended, locally or remotely.
    SignedOut,
    /// The access token was renewed for an already signed-in user.
    TokenRefreshed(Identity),
}
