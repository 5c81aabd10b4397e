//! Configuration options for the BNUPremios client

use std::time::Duration;

use premios_auth::AuthOptions;

use crate::error::Error;

/// Configuration options for the BNUPremios client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the API, including the version prefix
    pub api_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Where unauthenticated users are sent
    pub login_path: String,

    /// Where a login lands when there is no saved destination
    pub home_path: String,

    /// Grace period between the "please log in" warning and the redirect
    pub login_redirect_delay: Duration,

    /// Lifetime of notifications produced by the client itself
    pub notification_ttl: Option<Duration>,

    /// Whether the session is written to durable storage
    pub persist_session: bool,

    /// Storage key for the serialized identity
    pub user_storage_key: String,

    /// Storage key for the credential
    pub token_storage_key: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            login_path: "/auth/login".to_string(),
            home_path: "/".to_string(),
            login_redirect_delay: Duration::from_secs(2),
            notification_ttl: Some(Duration::from_secs(5)),
            persist_session: true,
            user_storage_key: "user".to_string(),
            token_storage_key: "token".to_string(),
        }
    }
}

impl ClientOptions {
    /// Build options from `PREMIOS_API_URL`, `PREMIOS_REQUEST_TIMEOUT_SECS`
    /// and `PREMIOS_LOGIN_PATH`, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, Error> {
        let mut options = Self::default();

        if let Ok(url) = std::env::var("PREMIOS_API_URL") {
            url::Url::parse(&url)?;
            options.api_url = url;
        }

        if let Ok(secs) = std::env::var("PREMIOS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("PREMIOS_REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            options.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Ok(path) = std::env::var("PREMIOS_LOGIN_PATH") {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "PREMIOS_LOGIN_PATH must start with '/': {}",
                    path
                )));
            }
            options.login_path = path;
        }

        Ok(options)
    }

    /// Set the API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the login path
    pub fn with_login_path(mut self, value: &str) -> Self {
        self.login_path = value.to_string();
        self
    }

    /// Set the home path
    pub fn with_home_path(mut self, value: &str) -> Self {
        self.home_path = value.to_string();
        self
    }

    /// Set the delay before redirecting an unauthenticated participant
    pub fn with_login_redirect_delay(mut self, value: Duration) -> Self {
        self.login_redirect_delay = value;
        self
    }

    /// Set the lifetime of client notifications
    pub fn with_notification_ttl(mut self, value: Option<Duration>) -> Self {
        self.notification_ttl = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Options for the session store
    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            persist_session: self.persist_session,
            user_key: self.user_storage_key.clone(),
            token_key: self.token_storage_key.clone(),
        }
    }
}
