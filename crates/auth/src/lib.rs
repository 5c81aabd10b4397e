//! BNUPremios auth client
//!
//! This crate owns "who is acting": the [`SessionStore`] holds the current
//! [`Identity`] and bearer [`Credential`], persists them through a
//! [`SessionStorage`] and restores them on startup.

mod storage;
mod types;

use log::{debug, warn};
use reqwest::Client;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

pub use storage::*;
pub use types::*;

/// Error type
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    ApiError { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Pull a human readable message out of an error body.
///
/// The API answers rejected requests with `{"error": "...", "message": "..."}`;
/// `message` carries the detail shown to users.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
struct Session {
    identity: Identity,
    credential: Option<Credential>,
}

/// Single source of truth for the acting identity.
///
/// All reads are synchronous and observe writes immediately: after
/// [`SessionStore::logout`] returns, [`SessionStore::is_authenticated`] is
/// `false` with no await in between.
pub struct SessionStore {
    url: String,
    http_client: Client,
    options: AuthOptions,
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
    status: watch::Sender<SessionStatus>,
}

impl SessionStore {
    /// Create a store talking to the API rooted at `url` (e.g.
    /// `http://localhost:8080/api/v1`). The store starts in the loading state
    /// until [`SessionStore::restore`] runs.
    pub fn new(
        url: &str,
        http_client: Client,
        storage: Arc<dyn SessionStorage>,
        options: AuthOptions,
    ) -> Result<Self, AuthError> {
        Url::parse(url)?;
        let (status, _) = watch::channel(SessionStatus {
            loading: true,
            authenticated: false,
        });

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            http_client,
            options,
            storage,
            current: RwLock::new(None),
            status,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth{}", self.url, path)
    }

    /// Load the persisted identity. An unreadable or unparseable entry is
    /// discarded and the store comes up logged out.
    pub fn restore(&self) {
        let restored = self.read_persisted();
        let authenticated = restored.is_some();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = restored;

        debug!("Session restored (authenticated: {})", authenticated);
        self.publish(false);
    }

    fn read_persisted(&self) -> Option<Session> {
        if !self.options.persist_session {
            return None;
        }

        let raw = match self.storage.get(&self.options.user_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read persisted user: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                let credential = match self.storage.get(&self.options.token_key) {
                    Ok(token) => token.filter(|t| !t.is_empty()).map(Credential::new),
                    Err(e) => {
                        warn!("Failed to read persisted token: {}", e);
                        None
                    }
                };
                Some(Session {
                    identity,
                    credential,
                })
            }
            Err(e) => {
                warn!("Discarding unparseable persisted user: {}", e);
                self.clear_persisted();
                None
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// Returns `false` on any failure (network, rejection, malformed
    /// response); callers show a generic message.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.authenticate(email, password).await {
            Ok(identity) => {
                debug!("Logged in as {}", identity.id);
                true
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                false
            }
        }
    }

    /// Sign in and return the new identity, or the reason it failed
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let payload = LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http_client
            .post(self.auth_url("/login"))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        if login.token.is_empty() {
            return Err(AuthError::MalformedResponse("empty token".to_string()));
        }

        self.set_session(login.user.clone(), Credential::new(login.token));
        Ok(login.user)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, payload: &RegisterPayload) -> bool {
        match self.try_register(payload).await {
            Ok(identity) => {
                debug!("Registered user {}", identity.id);
                true
            }
            Err(e) => {
                warn!("Registration failed: {}", e);
                false
            }
        }
    }

    /// Create an account and return the created record
    pub async fn try_register(&self, payload: &RegisterPayload) -> Result<Identity, AuthError> {
        let response = self
            .http_client
            .post(self.auth_url("/register"))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }

    /// Drop identity and credential, in memory and in storage
    pub fn logout(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.clear_persisted();
        debug!("Logged out");
        self.publish(self.is_loading());
    }

    /// Replace the session wholesale
    pub fn set_session(&self, identity: Identity, credential: Credential) {
        if self.options.persist_session {
            match serde_json::to_string(&identity) {
                Ok(json) => {
                    if let Err(e) = self.storage.set(&self.options.user_key, &json) {
                        warn!("Failed to persist user: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize user: {}", e),
            }
            if let Err(e) = self.storage.set(&self.options.token_key, credential.as_str()) {
                warn!("Failed to persist token: {}", e);
            }
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Session {
            identity,
            credential: Some(credential),
        });
        self.publish(self.is_loading());
    }

    fn clear_persisted(&self) {
        for key in [&self.options.user_key, &self.options.token_key] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove persisted {}: {}", key, e);
            }
        }
    }

    fn publish(&self, loading: bool) {
        let authenticated = self.is_authenticated();
        self.status.send_replace(SessionStatus {
            loading,
            authenticated,
        });
    }

    /// The current identity
    pub fn identity(&self) -> Option<Identity> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|s| s.identity.clone())
    }

    /// The current bearer credential
    pub fn credential(&self) -> Option<Credential> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().and_then(|s| s.credential.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `true` until [`SessionStore::restore`] has completed
    pub fn is_loading(&self) -> bool {
        self.status.borrow().loading
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Receive a [`SessionStatus`] on every change
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }
}
