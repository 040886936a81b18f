//! Unit tests for the error types.
//!
//! Error display strings are the user-visible messages the app surfaces in
//! its single message slot, so their exact wording matters.

use livemark::types::errors::{
    AuthError, QueryError, SettingsError, SubmitError, ValidationError, WriteError,
};

#[test]
fn test_auth_error_display() {
    assert_eq!(
        AuthError::SessionUnavailable("timeout".to_string()).to_string(),
        "Session unavailable: timeout"
    );
    assert_eq!(
        AuthError::SignInFailed("status 502".to_string()).to_string(),
        "Sign-in failed: status 502"
    );
    assert_eq!(
        AuthError::SignOutFailed("status 500".to_string()).to_string(),
        "Sign-out failed: status 500"
    );
    assert_eq!(
        AuthError::TokenInvalid("not a JWT".to_string()).to_string(),
        "Invalid access token: not a JWT"
    );
}

#[test]
fn test_query_error_display() {
    assert_eq!(
        QueryError::Network("connection refused".to_string()).to_string(),
        "Could not load bookmarks: connection refused"
    );
    assert_eq!(
        QueryError::Backend("status 500".to_string()).to_string(),
        "Bookmark query rejected: status 500"
    );
    assert_eq!(
        QueryError::Decode("expected value".to_string()).to_string(),
        "Malformed bookmark response: expected value"
    );
}

#[test]
fn test_write_error_display() {
    assert_eq!(
        WriteError::Network("connection reset".to_string()).to_string(),
        "Could not reach the backend: connection reset"
    );
    assert_eq!(
        WriteError::Denied("row ownership violation".to_string()).to_string(),
        "Not allowed: row ownership violation"
    );
    assert_eq!(
        WriteError::Backend("status 400".to_string()).to_string(),
        "Write rejected: status 400"
    );
}

#[test]
fn test_validation_error_messages_are_exact() {
    // These two strings are the local validation messages shown verbatim.
    assert_eq!(ValidationError::SignedOut.to_string(), "You must be signed in");
    assert_eq!(ValidationError::EmptyUrl.to_string(), "URL is required");
}

#[test]
fn test_settings_error_display() {
    assert_eq!(
        SettingsError::IoError("permission denied".to_string()).to_string(),
        "Settings I/O error: permission denied"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
}

#[test]
fn test_submit_error_delegates_display() {
    let validation: SubmitError = ValidationError::EmptyUrl.into();
    assert_eq!(validation.to_string(), "URL is required");

    let backend: SubmitError = WriteError::Backend("status 503".to_string()).into();
    assert_eq!(backend.to_string(), "Write rejected: status 503");
}

#[test]
fn test_submit_error_from_conversions() {
    let err: SubmitError = ValidationError::SignedOut.into();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::SignedOut)
    ));

    let err: SubmitError = WriteError::Network("x".to_string()).into();
    assert!(matches!(err, SubmitError::Backend(WriteError::Network(_))));
}

#[test]
fn test_errors_implement_std_error() {
    fn assert_error<E: std::error::Error>(_e: &E) {}
    assert_error(&AuthError::TokenInvalid("x".to_string()));
    assert_error(&QueryError::Network("x".to_string()));
    assert_error(&WriteError::Denied("x".to_string()));
    assert_error(&ValidationError::SignedOut);
    assert_error(&SettingsError::IoError("x".to_string()));
    assert_error(&SubmitError::Validation(ValidationError::EmptyUrl));
}
