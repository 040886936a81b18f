//! HTTP client for the hosted backend platform.
//!
//! REST reads and writes go through `{project_url}/rest/v1/bookmarks` and
//! always repeat the explicit owner filter; auth goes through
//! `{project_url}/auth/v1/*`; the live change feed is a server-sent-event
//! stream from `{project_url}/realtime/v1/bookmarks`. Tokens live in memory
//! for the duration of the session — nothing is persisted locally.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{AuthFeed, BackendClient, ChangeFeed, SubscriptionGuard};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{AuthError, QueryError, WriteError};
use crate::types::event::ChangeEvent;
use crate::types::identity::{AuthEvent, Identity};
use crate::types::settings::BackendSettings;

/// Margin subtracted from `expires_in` when scheduling a token refresh.
const REFRESH_MARGIN_SECS: u64 = 60;
const MIN_REFRESH_DELAY_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
    email: Option<String>,
}

#[derive(Default)]
struct Shared {
    access_token: Option<String>,
    refresh_token: Option<String>,
    identity: Option<Identity>,
    next_feed_id: u64,
    auth_feeds: Vec<(u64, UnboundedSender<AuthEvent>)>,
    refresh_task: Option<JoinHandle<()>>,
}

impl Shared {
    fn broadcast_auth(&mut self, event: AuthEvent) {
        self.auth_feeds.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    fn clear_session(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        self.access_token = None;
        self.refresh_token = None;
        self.identity = None;
    }
}

/// [`BackendClient`] implementation against the hosted platform.
pub struct HttpBackend {
    http: reqwest::Client,
    project_url: String,
    api_key: String,
    provider: String,
    timeout: Duration,
    shared: Arc<Mutex<Shared>>,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_url: settings.project_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            provider: settings.oauth_provider.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("http backend state poisoned")
    }

    /// Request builder with the api key, per-request timeout, and the bearer
    /// token when a session is active.
    fn authed(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header("apikey", &self.api_key)
            .timeout(self.timeout);
        let token = self.lock().access_token.clone();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn store_session(&self, token: TokenResponse, identity: Identity) {
        let mut shared = self.lock();
        if let Some(task) = shared.refresh_task.take() {
            task.abort();
        }
        shared.refresh_token = token.refresh_token;
        shared.access_token = Some(token.access_token);
        shared.identity = Some(identity.clone());
        if shared.refresh_token.is_some() {
            let delay = refresh_delay(token.expires_in);
            shared.refresh_task = Some(tokio::spawn(run_refresh_loop(
                self.http.clone(),
                self.project_url.clone(),
                self.api_key.clone(),
                Arc::clone(&self.shared),
                delay,
            )));
        }
        shared.broadcast_auth(AuthEvent::SignedIn(identity));
    }
}

impl Drop for HttpBackend {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.lock() {
            if let Some(task) = shared.refresh_task.take() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        if self.lock().access_token.is_none() {
            return Ok(None);
        }
        let url = format!("{}/auth/v1/user", self.project_url);
        let response = self
            .authed(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| AuthError::SessionUnavailable(e.to_string()))?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Expired or revoked token: an unauthenticated session, not an error.
            self.lock().clear_session();
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AuthError::SessionUnavailable(format!(
                "status {}",
                response.status()
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::SessionUnavailable(e.to_string()))?;
        let user: UserPayload = serde_json::from_str(&text)
            .map_err(|e| AuthError::SessionUnavailable(e.to_string()))?;
        let identity = Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        };
        self.lock().identity = Some(identity.clone());
        Ok(Some(identity))
    }

    fn subscribe_auth(&self) -> AuthFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.lock();
        let id = shared.next_feed_id;
        shared.next_feed_id += 1;
        shared.auth_feeds.push((id, tx));
        let state = Arc::clone(&self.shared);
        AuthFeed {
            events: rx,
            guard: SubscriptionGuard::new(move || {
                if let Ok(mut shared) = state.lock() {
                    shared.auth_feeds.retain(|(fid, _)| *fid != id);
                }
            }),
        }
    }

    async fn sign_in(&self) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/authorize", self.project_url);
        let body = serde_json::json!({ "provider": self.provider });
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AuthError::SignInFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::SignInFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::SignInFailed(e.to_string()))?;
        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::SignInFailed(e.to_string()))?;
        let identity = match &token.user {
            Some(user) => Identity {
                id: user.id.clone(),
                email: user.email.clone().unwrap_or_default(),
            },
            None => identity_from_token(&token.access_token)?,
        };
        debug!(user = %identity.id, "signed in");
        self.store_session(token, identity);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.lock().access_token.clone();
        let revoke_result = match token {
            Some(_) => {
                let url = format!("{}/auth/v1/logout", self.project_url);
                match self.authed(reqwest::Method::POST, &url).send().await {
                    Ok(response) if response.status().is_success() => Ok(()),
                    Ok(response) => Err(AuthError::SignOutFailed(format!(
                        "status {}",
                        response.status()
                    ))),
                    Err(e) => Err(AuthError::SignOutFailed(e.to_string())),
                }
            }
            None => Ok(()),
        };
        // Local session state is cleared and the transition emitted even when
        // the revoke request fails.
        let mut shared = self.lock();
        shared.clear_session();
        shared.broadcast_auth(AuthEvent::SignedOut);
        drop(shared);
        revoke_result
    }

    async fn fetch_bookmarks(&self, owner_id: &str) -> Result<Vec<Bookmark>, QueryError> {
        let url = format!(
            "{}/rest/v1/bookmarks?owner_id=eq.{}&order=created_at.desc",
            self.project_url, owner_id
        );
        let response = self
            .authed(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(QueryError::Backend(format!("status {}", response.status())));
        }
        let text = response
            .text()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| QueryError::Decode(e.to_string()))
    }

    async fn insert_bookmark(
        &self,
        owner_id: &str,
        url: &str,
        title: &str,
    ) -> Result<(), WriteError> {
        let endpoint = format!("{}/rest/v1/bookmarks", self.project_url);
        let body = serde_json::json!({
            "owner_id": owner_id,
            "url": url,
            "title": title,
        });
        let response = self
            .authed(reqwest::Method::POST, &endpoint)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| WriteError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(WriteError::Denied(format!(
                "insert denied for owner {}",
                owner_id
            )))
        } else {
            Err(WriteError::Backend(format!("status {}", status)))
        }
    }

    async fn delete_bookmark(&self, id: &str, owner_id: &str) -> Result<(), WriteError> {
        let endpoint = format!(
            "{}/rest/v1/bookmarks?id=eq.{}&owner_id=eq.{}",
            self.project_url, id, owner_id
        );
        let response = self
            .authed(reqwest::Method::DELETE, &endpoint)
            .send()
            .await
            .map_err(|e| WriteError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(WriteError::Denied(format!(
                "delete denied for owner {}",
                owner_id
            )))
        } else {
            Err(WriteError::Backend(format!("status {}", status)))
        }
    }

    fn subscribe_changes(&self, owner_id: &str) -> ChangeFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let url = format!(
            "{}/realtime/v1/bookmarks?owner_id=eq.{}",
            self.project_url, owner_id
        );
        let http = self.http.clone();
        let api_key = self.api_key.clone();
        let token = self.lock().access_token.clone();
        let reader = tokio::spawn(run_change_stream(http, url, api_key, token, tx));
        ChangeFeed {
            events: rx,
            guard: SubscriptionGuard::new(move || reader.abort()),
        }
    }
}

fn refresh_delay(expires_in: Option<u64>) -> Duration {
    let secs = expires_in
        .unwrap_or(3600)
        .saturating_sub(REFRESH_MARGIN_SECS)
        .max(MIN_REFRESH_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Recovers the identity from the JWT payload when the token response does
/// not carry a user object. Decoded unverified — signature checking is the
/// platform's job, not this client's.
fn identity_from_token(access_token: &str) -> Result<Identity, AuthError> {
    let payload = access_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::TokenInvalid("not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
    let claims: TokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
    Ok(Identity {
        id: claims.sub,
        email: claims.email.unwrap_or_default(),
    })
}

/// Parses one server-sent-event line. Only `data:` lines carry change
/// payloads; comments, event names, ids, and blank keep-alive lines are
/// skipped.
fn parse_sse_line(line: &str) -> Option<ChangeEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChangeEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "skipping unparseable change event");
            None
        }
    }
}

async fn run_change_stream(
    http: reqwest::Client,
    url: String,
    api_key: String,
    token: Option<String>,
    tx: UnboundedSender<ChangeEvent>,
) {
    let mut request = http
        .get(&url)
        .header("apikey", &api_key)
        .header("Accept", "text/event-stream");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let mut response = match request.send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!(status = %response.status(), "change feed rejected");
            return;
        }
        Err(e) => {
            warn!(error = %e, "change feed connect failed");
            return;
        }
    };
    let mut buffer = String::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    if let Some(event) = parse_sse_line(line.trim_end_matches(['\n', '\r'])) {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            }
            Ok(None) => {
                debug!("change feed closed by server");
                return;
            }
            Err(e) => {
                warn!(error = %e, "change feed read failed");
                return;
            }
        }
    }
}

async fn run_refresh_loop(
    http: reqwest::Client,
    project_url: String,
    api_key: String,
    shared: Arc<Mutex<Shared>>,
    mut delay: Duration,
) {
    loop {
        tokio::time::sleep(delay).await;
        let refresh_token = {
            let shared = shared.lock().expect("http backend state poisoned");
            shared.refresh_token.clone()
        };
        let Some(refresh_token) = refresh_token else {
            return;
        };
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", project_url);
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let result = async {
            let response = http
                .post(&url)
                .header("apikey", &api_key)
                .header("Content-Type", "application/json")
                .body(body.to_string())
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(format!("status {}", response.status()));
            }
            let text = response.text().await.map_err(|e| e.to_string())?;
            serde_json::from_str::<TokenResponse>(&text).map_err(|e| e.to_string())
        }
        .await;
        let mut state = shared.lock().expect("http backend state poisoned");
        match result {
            Ok(token) => {
                state.access_token = Some(token.access_token);
                if token.refresh_token.is_some() {
                    state.refresh_token = token.refresh_token;
                }
                delay = refresh_delay(token.expires_in);
                if let Some(identity) = state.identity.clone() {
                    debug!(user = %identity.id, "session token refreshed");
                    state.broadcast_auth(AuthEvent::TokenRefreshed(identity));
                }
            }
            Err(e) => {
                // The session is gone; surface it as a sign-out transition.
                warn!(error = %e, "token refresh failed, session expired");
                state.access_token = None;
                state.refresh_token = None;
                state.identity = None;
                state.broadcast_auth(AuthEvent::SignedOut);
                return;
            }
        }
    }
}
