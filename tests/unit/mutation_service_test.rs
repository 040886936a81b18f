//! Unit tests for the mutation submitter: local validation, trimming and
//! title defaulting, form lifecycle, and owner-constrained deletes.

use std::sync::Arc;

use rstest::rstest;

use livemark::backend::memory::MemoryBackend;
use livemark::backend::BackendClient;
use livemark::services::mutation_service::{MutationService, MutationServiceTrait};
use livemark::types::errors::{SubmitError, ValidationError};
use livemark::types::identity::Identity;

fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: format!("{}@example.com", id),
    }
}

fn signed_in_backend(user: &str) -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.register_user(user, &format!("{}@example.com", user));
    backend.sign_in_as(user).unwrap();
    backend
}

#[tokio::test]
async fn test_create_requires_identity() {
    let backend = Arc::new(MemoryBackend::new());
    let mut service = MutationService::new(backend.clone());
    service.set_url("https://example.com");

    let err = service.submit_create(None).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::SignedOut)
    ));
    // No backend contact happened.
    assert!(backend.stored("u1").is_empty());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
#[tokio::test]
async fn test_create_rejects_blank_url_locally(#[case] url: &str) {
    let backend = signed_in_backend("u1");
    let mut service = MutationService::new(backend.clone());
    service.set_url(url);

    let err = service.submit_create(Some(&identity("u1"))).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::EmptyUrl)
    ));
    assert!(backend.stored("u1").is_empty());
}

#[rstest]
#[case("example.com", "", "example.com", "example.com")]
#[case("  example.com  ", "  ", "example.com", "example.com")]
#[case("https://docs.rs", "  Docs.rs  ", "https://docs.rs", "Docs.rs")]
#[tokio::test]
async fn test_create_trims_and_defaults_title(
    #[case] url_input: &str,
    #[case] title_input: &str,
    #[case] expected_url: &str,
    #[case] expected_title: &str,
) {
    let backend = signed_in_backend("u1");
    let mut service = MutationService::new(backend.clone());
    service.set_url(url_input);
    service.set_title(title_input);

    service.submit_create(Some(&identity("u1"))).await.unwrap();

    let stored = backend.stored("u1");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, expected_url);
    assert_eq!(stored[0].title, expected_title);
    assert_eq!(stored[0].owner_id, "u1");
}

#[tokio::test]
async fn test_create_clears_form_on_success() {
    let backend = signed_in_backend("u1");
    let mut service = MutationService::new(backend);
    service.set_url("https://example.com");
    service.set_title("Example");

    service.submit_create(Some(&identity("u1"))).await.unwrap();

    assert_eq!(service.form().url, "");
    assert_eq!(service.form().title, "");
    assert!(!service.is_submitting());
}

#[tokio::test]
async fn test_create_failure_leaves_form_intact() {
    let backend = signed_in_backend("u1");
    backend.set_fail_writes(true);
    let mut service = MutationService::new(backend);
    service.set_url("https://example.com");
    service.set_title("Example");

    let err = service.submit_create(Some(&identity("u1"))).await.unwrap_err();
    assert!(matches!(err, SubmitError::Backend(_)));
    assert_eq!(service.form().url, "https://example.com");
    assert_eq!(service.form().title, "Example");
    assert!(!service.is_submitting());
}

#[tokio::test]
async fn test_create_emits_insert_event() {
    let backend = signed_in_backend("u1");
    let mut feed = backend.subscribe_changes("u1");
    let mut service = MutationService::new(backend);
    service.set_url("example.com");

    service.submit_create(Some(&identity("u1"))).await.unwrap();

    let event = feed.events.try_recv().expect("insert event was emitted");
    assert_eq!(event.record.url, "example.com");
}

#[tokio::test]
async fn test_delete_requires_identity() {
    let backend = Arc::new(MemoryBackend::new());
    let mut service = MutationService::new(backend);

    let err = service.submit_delete(None, "r1").await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::SignedOut)
    ));
}

#[tokio::test]
async fn test_delete_removes_owned_record() {
    let backend = signed_in_backend("u1");
    let record = backend.seed_bookmark("u1", "https://example.com", "Example");
    let mut service = MutationService::new(backend.clone());

    service
        .submit_delete(Some(&identity("u1")), &record.id)
        .await
        .unwrap();

    assert!(backend.stored("u1").is_empty());
}

#[tokio::test]
async fn test_delete_is_constrained_to_owner() {
    // A record owned by someone else survives a delete request from this
    // identity: the (id, owner) filter matches zero rows.
    let backend = signed_in_backend("u1");
    backend.register_user("u2", "u2@example.com");
    let foreign = backend.seed_bookmark("u2", "https://example.com", "Not ours");
    let mut service = MutationService::new(backend.clone());

    service
        .submit_delete(Some(&identity("u1")), &foreign.id)
        .await
        .unwrap();

    assert_eq!(backend.stored("u2").len(), 1);
}

#[tokio::test]
async fn test_delete_failure_is_surfaced() {
    let backend = signed_in_backend("u1");
    let record = backend.seed_bookmark("u1", "https://example.com", "Example");
    backend.set_fail_writes(true);
    let mut service = MutationService::new(backend);

    let err = service
        .submit_delete(Some(&identity("u1")), &record.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Backend(_)));
    assert!(!service.is_submitting());
}
