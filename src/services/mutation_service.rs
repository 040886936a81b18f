//! Bookmark create/delete submission.
//!
//! Owns the add-bookmark form state and the per-operation submitting flag.
//! Never touches the collection: the backend's resulting insert/delete
//! event drives the displayed state through the one reconciliation path, so
//! there is no separate optimistic-update path to diverge from it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::backend::BackendClient;
use crate::types::errors::{SubmitError, ValidationError};
use crate::types::identity::Identity;

/// Form input state for the add-bookmark form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkForm {
    pub url: String,
    pub title: String,
}

/// Trait defining the mutation submitter interface.
#[async_trait]
pub trait MutationServiceTrait {
    /// Submits the form as a new bookmark owned by `identity`.
    ///
    /// Local preconditions are checked before any backend contact: a signed-in
    /// identity and a non-empty trimmed URL. The trimmed title defaults to
    /// the URL when blank. On success the form inputs are cleared; on failure
    /// they are left intact. Each failure requires a new user action — there
    /// is no retry.
    async fn submit_create(&mut self, identity: Option<&Identity>) -> Result<(), SubmitError>;

    /// Deletes a record, constrained by both its id and the current
    /// identity as owner.
    async fn submit_delete(
        &mut self,
        identity: Option<&Identity>,
        record_id: &str,
    ) -> Result<(), SubmitError>;

    fn form(&self) -> &BookmarkForm;
    fn set_url(&mut self, url: &str);
    fn set_title(&mut self, title: &str);
    fn is_submitting(&self) -> bool;
}

/// Mutation submitter backed by the injected backend client.
pub struct MutationService {
    backend: Arc<dyn BackendClient>,
    form: BookmarkForm,
    submitting: bool,
}

impl MutationService {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            form: BookmarkForm::default(),
            submitting: false,
        }
    }
}

#[async_trait]
impl MutationServiceTrait for MutationService {
    async fn submit_create(&mut self, identity: Option<&Identity>) -> Result<(), SubmitError> {
        let identity = identity.ok_or(ValidationError::SignedOut)?;
        let url = self.form.url.trim().to_string();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }
        let title = {
            let trimmed = self.form.title.trim();
            if trimmed.is_empty() {
                url.clone()
            } else {
                trimmed.to_string()
            }
        };

        self.submitting = true;
        let result = self
            .backend
            .insert_bookmark(&identity.id, &url, &title)
            .await;
        self.submitting = false;

        match result {
            Ok(()) => {
                debug!(owner = %identity.id, url = %url, "bookmark submitted");
                self.form.url.clear();
                self.form.title.clear();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn submit_delete(
        &mut self,
        identity: Option<&Identity>,
        record_id: &str,
    ) -> Result<(), SubmitError> {
        let identity = identity.ok_or(ValidationError::SignedOut)?;

        self.submitting = true;
        let result = self.backend.delete_bookmark(record_id, &identity.id).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                debug!(owner = %identity.id, id = %record_id, "bookmark delete submitted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn form(&self) -> &BookmarkForm {
        &self.form
    }

    fn set_url(&mut self, url: &str) {
        self.form.url = url.to_string();
    }

    fn set_title(&mut self, title: &str) {
        self.form.title = title.to_string();
    }

    fn is_submitting(&self) -> bool {
        self.submitting
    }
}
