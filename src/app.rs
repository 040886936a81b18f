//! App core for Livemark.
//!
//! Central struct holding the injected backend client, the managers, and
//! the single user-visible error slot. All state mutation happens in
//! [`App::handle_event`] and the command methods, driven from one logical
//! execution context; the spawned tasks (auth forwarder, change forwarder,
//! snapshot fetch) only forward messages and never touch shared state, so
//! no locking is needed around the collection.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::backend::BackendClient;
use crate::managers::collection_manager::{CollectionManager, CollectionManagerTrait};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait, SessionTransition};
use crate::managers::sync_manager::{SyncManager, SyncManagerTrait};
use crate::services::mutation_service::{BookmarkForm, MutationService, MutationServiceTrait};
use crate::types::bookmark::Bookmark;
use crate::types::event::AppEvent;
use crate::types::identity::Identity;
use crate::ui::view::AppView;

/// Central application struct wiring the managers together.
///
/// The backend collaborator is dependency-injected so the whole app can run
/// against [`MemoryBackend`](crate::backend::memory::MemoryBackend) in tests
/// and against [`HttpBackend`](crate::backend::http::HttpBackend) in
/// production.
pub struct App {
    backend: Arc<dyn BackendClient>,
    session: SessionManager,
    collection: CollectionManager,
    sync: SyncManager,
    mutation: MutationService,
    /// The single user-visible message slot all backend errors surface in.
    error: Option<String>,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: Option<UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session: SessionManager::new(Arc::clone(&backend)),
            collection: CollectionManager::new(),
            sync: SyncManager::new(Arc::clone(&backend)),
            mutation: MutationService::new(Arc::clone(&backend)),
            backend,
            error: None,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Startup sequence: register for session transitions, query the current
    /// identity once, and start syncing when a session exists.
    ///
    /// The auth feed is subscribed before the initial query so a transition
    /// landing in the gap is not missed. A failed initial query surfaces its
    /// message and leaves the app unauthenticated; there is no retry.
    pub async fn initialize(&mut self) {
        let feed = self.backend.subscribe_auth();
        self.session.attach_registration(feed.guard);
        let tx = self.events_tx.clone();
        let mut rx = feed.events;
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if tx.send(AppEvent::Auth(event)).is_err() {
                    break;
                }
            }
        });

        match self.session.initialize().await {
            Ok(Some(identity)) => {
                let owner = identity.id.clone();
                self.start_sync(&owner);
            }
            Ok(None) => {}
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    fn start_sync(&mut self, owner_id: &str) {
        self.collection.set_loading(true);
        self.sync.start(owner_id, &self.events_tx);
    }

    /// Applies one app-loop message. Synchronous: every suspension point
    /// lives in the tasks that produce these messages, not here.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Auth(event) => match self.session.apply(event) {
                SessionTransition::SignedIn(identity) | SessionTransition::Switched(identity) => {
                    // The new identity starts from an empty collection until
                    // its own snapshot resolves.
                    self.collection.clear();
                    self.error = None;
                    self.start_sync(&identity.id);
                }
                SessionTransition::Refreshed => {}
                SessionTransition::SignedOut => {
                    // Cleared here, bound to the transition itself, so the
                    // collection empties independent of any pending network
                    // responses.
                    self.collection.clear();
                    self.collection.set_loading(false);
                    self.sync.stop();
                    self.error = None;
                }
            },
            AppEvent::Snapshot { epoch, result } => {
                if !self.sync.is_current(epoch) {
                    debug!(epoch, "discarding stale snapshot");
                    return;
                }
                self.collection.set_loading(false);
                match result {
                    Ok(records) => {
                        self.collection.replace_all(records);
                        self.error = None;
                    }
                    Err(e) => {
                        self.error = Some(e.to_string());
                    }
                }
            }
            AppEvent::Change { epoch, event } => {
                if self.sync.is_current(epoch) {
                    self.collection.apply(event);
                }
            }
        }
    }

    /// Waits for the next app-loop message and applies it. Returns `false`
    /// when the channel is closed or the receiver was handed off via
    /// [`take_events`](App::take_events).
    pub async fn process_next(&mut self) -> bool {
        let Some(rx) = self.events_rx.as_mut() else {
            return false;
        };
        match rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Applies every already-queued message without waiting. Returns how
    /// many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(rx) = self.events_rx.as_mut() else {
                return applied;
            };
            match rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(_) => return applied,
            }
        }
    }

    /// Hands the app-event receiver to an external driver (the webview
    /// shell's pump task). After this, `process_next` returns `false`.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<AppEvent>> {
        self.events_rx.take()
    }

    // ─── Commands ───

    pub async fn sign_in(&mut self) {
        if let Err(e) = self.backend.sign_in().await {
            self.error = Some(e.to_string());
        }
    }

    /// Requests a sign-out. The collection clearing happens when the
    /// resulting `SignedOut` transition is handled, exactly as it would for
    /// a sign-out initiated elsewhere.
    pub async fn sign_out(&mut self) {
        if let Err(e) = self.backend.sign_out().await {
            self.error = Some(e.to_string());
        }
    }

    /// Submits the add-bookmark form. The collection is updated by the
    /// resulting insert event, not here.
    pub async fn create_bookmark(&mut self) {
        let identity = self.session.identity().cloned();
        match self.mutation.submit_create(identity.as_ref()).await {
            Ok(()) => {
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    /// Requests deletion of one record, constrained to the current identity
    /// as owner. Silent on success.
    pub async fn delete_bookmark(&mut self, record_id: &str) {
        let identity = self.session.identity().cloned();
        if let Err(e) = self.mutation.submit_delete(identity.as_ref(), record_id).await {
            self.error = Some(e.to_string());
        }
    }

    pub fn set_form_url(&mut self, url: &str) {
        self.mutation.set_url(url);
    }

    pub fn set_form_title(&mut self, title: &str) {
        self.mutation.set_title(title);
    }

    /// Shutdown sequence: close the change feed and release the auth
    /// registration. Skipping this would leak a live feed.
    pub fn shutdown(&mut self) {
        self.sync.stop();
        self.session.close();
    }

    // ─── State accessors ───

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.collection.records()
    }

    pub fn is_loading(&self) -> bool {
        self.collection.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn form(&self) -> &BookmarkForm {
        self.mutation.form()
    }

    pub fn is_submitting(&self) -> bool {
        self.mutation.is_submitting()
    }

    /// Current sync generation; results tagged with an older epoch are
    /// discarded on arrival.
    pub fn sync_epoch(&self) -> u64 {
        self.sync.epoch()
    }

    /// Snapshot of everything the presentation layer renders.
    pub fn view(&self) -> AppView {
        AppView {
            identity: self.session.identity().cloned(),
            loading: self.collection.is_loading(),
            error: self.error.clone(),
            bookmarks: self.collection.records().to_vec(),
            form_url: self.mutation.form().url.clone(),
            form_title: self.mutation.form().title.clone(),
            submitting: self.mutation.is_submitting(),
        }
    }
}
