//! Error handling for the BNUPremios client

use std::fmt;
use thiserror::Error;

/// Server messages that mean the credential is no longer accepted
const EXPIRED_CREDENTIAL_MARKERS: [&str; 2] = ["token is expired", "token has invalid claims"];

/// Unified error type for the BNUPremios client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors (no usable response)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed or unexpected payloads
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session store errors
    #[error("Authentication error: {0}")]
    Auth(#[from] premios_auth::AuthError),

    /// The server rejected the request
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The credential is missing, expired or invalid. The session has
    /// already been cleared when this is returned.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rejected locally before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// The message the server attached to a rejected request, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Api {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether this error means the credential is no longer valid: a 401, or
    /// a server message saying the token expired or carries invalid claims.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Error::Unauthorized(_) => true,
            Error::Api { status, message } => {
                *status == 401
                    || message.as_deref().is_some_and(|m| {
                        EXPIRED_CREDENTIAL_MARKERS
                            .iter()
                            .any(|marker| m.contains(marker))
                    })
            }
            _ => false,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
