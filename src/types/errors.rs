use std::fmt;

// === AuthError ===

/// Errors from session queries and sign-in/sign-out operations.
#[derive(Debug)]
pub enum AuthError {
    /// The current-session query could not be answered.
    SessionUnavailable(String),
    /// Sign-in through the OAuth provider failed.
    SignInFailed(String),
    /// Sign-out failed; local session state is cleared regardless.
    SignOutFailed(String),
    /// The access token could not be decoded into an identity.
    TokenInvalid(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::SessionUnavailable(msg) => write!(f, "Session unavailable: {}", msg),
            AuthError::SignInFailed(msg) => write!(f, "Sign-in failed: {}", msg),
            AuthError::SignOutFailed(msg) => write!(f, "Sign-out failed: {}", msg),
            AuthError::TokenInvalid(msg) => write!(f, "Invalid access token: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === QueryError ===

/// Errors from the bookmark snapshot fetch.
#[derive(Debug)]
pub enum QueryError {
    /// The request never produced a response.
    Network(String),
    /// The backend answered with an error.
    Backend(String),
    /// The response body could not be decoded.
    Decode(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Network(msg) => write!(f, "Could not load bookmarks: {}", msg),
            QueryError::Backend(msg) => write!(f, "Bookmark query rejected: {}", msg),
            QueryError::Decode(msg) => write!(f, "Malformed bookmark response: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

// === WriteError ===

/// Errors from bookmark insert and delete requests.
#[derive(Debug)]
pub enum WriteError {
    /// The request never produced a response.
    Network(String),
    /// The backend refused the write for this identity.
    Denied(String),
    /// The backend answered with an error.
    Backend(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Network(msg) => write!(f, "Could not reach the backend: {}", msg),
            WriteError::Denied(msg) => write!(f, "Not allowed: {}", msg),
            WriteError::Backend(msg) => write!(f, "Write rejected: {}", msg),
        }
    }
}

impl std::error::Error for WriteError {}

// === ValidationError ===

/// Local precondition failures. These never reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A mutation was attempted without a signed-in identity.
    SignedOut,
    /// The URL input was empty after trimming.
    EmptyUrl,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SignedOut => write!(f, "You must be signed in"),
            ValidationError::EmptyUrl => write!(f, "URL is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

// === SettingsError ===

/// Errors related to settings persistence.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === SubmitError ===

/// Outcome of a create/delete submission: either a local validation
/// failure or an error reported by the backend.
#[derive(Debug)]
pub enum SubmitError {
    Validation(ValidationError),
    Backend(WriteError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Validation(err) => write!(f, "{}", err),
            SubmitError::Backend(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        SubmitError::Validation(err)
    }
}

impl From<WriteError> for SubmitError {
    fn from(err: WriteError) -> Self {
        SubmitError::Backend(err)
    }
}
