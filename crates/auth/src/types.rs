//! Types for authentication and the acting identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user, as returned by the login endpoint and as persisted
/// between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdentityRecord")]
pub struct Identity {
    /// The user ID
    pub id: String,

    /// Display name
    pub name: String,

    /// The user's email address
    pub email: String,

    /// The user's phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// When the user joined. The server reports this as `created_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
}

/// Identity as it arrives on the wire. The join date may come under any
/// of three names, possibly several at once.
#[derive(Deserialize)]
struct IdentityRecord {
    id: String,
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    join_date: Option<String>,
    #[serde(default, rename = "joinDate")]
    join_date_camel: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<IdentityRecord> for Identity {
    fn from(record: IdentityRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            avatar: record.avatar,
            join_date: record
                .join_date
                .or(record.join_date_camel)
                .or(record.created_at),
        }
    }
}

/// Opaque bearer token. The client only ever checks for its presence and
/// attaches it to protected requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful login response: `{token, user}`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Identity,
}

/// Snapshot of the session published to subscribers on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    /// `true` until `restore()` has completed
    pub loading: bool,
    pub authenticated: bool,
}

/// Session store options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Whether identity and credential are written to durable storage
    pub persist_session: bool,
    /// Storage key for the serialized identity
    pub user_key: String,
    /// Storage key for the credential token
    pub token_key: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            user_key: "user".to_string(),
            token_key: "token".to_string(),
        }
    }
}
