//! Unit tests for the in-process backend: owner scoping, event routing,
//! and feed lifecycle.

use std::sync::Arc;

use livemark::backend::memory::MemoryBackend;
use livemark::backend::BackendClient;
use livemark::types::errors::{QueryError, WriteError};
use livemark::types::event::ChangeKind;
use livemark::types::identity::AuthEvent;

fn backend_with_users() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.register_user("u1", "u1@example.com");
    backend.register_user("u2", "u2@example.com");
    backend
}

#[tokio::test]
async fn test_fetch_returns_only_owner_rows_newest_first() {
    let backend = backend_with_users();
    backend.seed_bookmark("u1", "https://a.example.com", "A");
    backend.seed_bookmark("u2", "https://x.example.com", "X");
    backend.seed_bookmark("u1", "https://b.example.com", "B");
    backend.sign_in_as("u1").unwrap();

    let rows = backend.fetch_bookmarks("u1").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "B");
    assert_eq!(rows[1].title, "A");
    assert!(rows.iter().all(|r| r.owner_id == "u1"));
}

#[tokio::test]
async fn test_fetch_for_other_owner_is_denied() {
    let backend = backend_with_users();
    backend.sign_in_as("u1").unwrap();

    let err = backend.fetch_bookmarks("u2").await.unwrap_err();
    assert!(matches!(err, QueryError::Backend(_)));
}

#[tokio::test]
async fn test_fetch_without_session_is_denied() {
    let backend = backend_with_users();
    let err = backend.fetch_bookmarks("u1").await.unwrap_err();
    assert!(matches!(err, QueryError::Backend(_)));
}

#[tokio::test]
async fn test_insert_requires_matching_session() {
    let backend = backend_with_users();
    backend.sign_in_as("u1").unwrap();

    let err = backend
        .insert_bookmark("u2", "https://x.example.com", "X")
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Denied(_)));
    assert!(backend.stored("u2").is_empty());
}

#[tokio::test]
async fn test_insert_assigns_id_and_increasing_created_at() {
    let backend = backend_with_users();
    backend.sign_in_as("u1").unwrap();

    backend
        .insert_bookmark("u1", "https://a.example.com", "A")
        .await
        .unwrap();
    backend
        .insert_bookmark("u1", "https://b.example.com", "B")
        .await
        .unwrap();

    let rows = backend.stored("u1");
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].id.is_empty());
    assert_ne!(rows[0].id, rows[1].id);
    // Newest first.
    assert!(rows[0].created_at > rows[1].created_at);
}

#[tokio::test]
async fn test_change_events_are_routed_by_owner() {
    let backend = backend_with_users();
    backend.sign_in_as("u1").unwrap();

    let mut u1_feed = backend.subscribe_changes("u1");
    let mut u2_feed = backend.subscribe_changes("u2");

    backend
        .insert_bookmark("u1", "https://a.example.com", "A")
        .await
        .unwrap();

    let event = u1_feed.events.try_recv().expect("u1 feed received event");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.record.owner_id, "u1");
    assert!(u2_feed.events.try_recv().is_err());
}

#[tokio::test]
async fn test_remote_hooks_emit_update_and_delete_events() {
    let backend = backend_with_users();
    let record = backend.seed_bookmark("u1", "https://a.example.com", "A");
    let mut feed = backend.subscribe_changes("u1");

    backend.remote_update(&record.id, "https://a.example.com", "A, renamed");
    let event = feed.events.try_recv().unwrap();
    assert_eq!(event.kind, ChangeKind::Update);
    assert_eq!(event.record.title, "A, renamed");

    backend.remote_delete(&record.id);
    let event = feed.events.try_recv().unwrap();
    assert_eq!(event.kind, ChangeKind::Delete);
    assert!(backend.stored("u1").is_empty());
}

#[tokio::test]
async fn test_dropping_guard_closes_feed() {
    let backend = backend_with_users();
    let feed = backend.subscribe_changes("u1");
    assert_eq!(backend.open_change_feeds(), 1);

    drop(feed);
    assert_eq!(backend.open_change_feeds(), 0);
    // Emitting afterwards reaches nobody and must not fail.
    backend.remote_insert("u1", "https://a.example.com", "A");
}

#[tokio::test]
async fn test_auth_feed_lifecycle() {
    let backend = backend_with_users();
    let mut feed = backend.subscribe_auth();
    assert_eq!(backend.open_auth_feeds(), 1);

    backend.sign_in().await.unwrap();
    let event = feed.events.try_recv().unwrap();
    assert!(matches!(event, AuthEvent::SignedIn(identity) if identity.id == "u1"));

    backend.refresh_session();
    let event = feed.events.try_recv().unwrap();
    assert!(matches!(event, AuthEvent::TokenRefreshed(_)));

    backend.sign_out().await.unwrap();
    let event = feed.events.try_recv().unwrap();
    assert!(matches!(event, AuthEvent::SignedOut));

    feed.guard.close();
    assert_eq!(backend.open_auth_feeds(), 0);
}

#[tokio::test]
async fn test_sign_in_uses_first_registered_user() {
    let backend = backend_with_users();
    backend.sign_in().await.unwrap();
    let identity = backend.current_identity().await.unwrap().unwrap();
    assert_eq!(identity.id, "u1");
}

#[tokio::test]
async fn test_sign_in_without_users_fails() {
    let backend = Arc::new(MemoryBackend::new());
    assert!(backend.sign_in().await.is_err());
}

#[tokio::test]
async fn test_failure_toggles() {
    let backend = backend_with_users();
    backend.sign_in_as("u1").unwrap();

    backend.set_fail_queries(true);
    assert!(backend.fetch_bookmarks("u1").await.is_err());
    backend.set_fail_queries(false);
    assert!(backend.fetch_bookmarks("u1").await.is_ok());

    backend.set_fail_writes(true);
    assert!(backend
        .insert_bookmark("u1", "https://a.example.com", "A")
        .await
        .is_err());

    backend.set_fail_auth(true);
    assert!(backend.current_identity().await.is_err());
}
