//! Account domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types (which decide what is exposed over the wire — the password hash
//! never is).

use serde::{Deserialize, Serialize};

use crate::auth::roles::Role;

/// A registered principal.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub username: String,
    /// bcrypt hash. Never logged, never serialized to clients.
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — account ID (standard JWT `sub` claim).
    pub sub: String,
    /// Unique token id (standard JWT `jti` claim). Timestamps have second
    /// granularity, so without this two tokens minted back-to-back for one
    /// account would be byte-identical — and identical refresh tokens share
    /// one registry fingerprint, breaking rotation and per-device logout.
    pub jti: String,
    /// Role at issuance time. Middleware re-reads the current role from
    /// the credential store; this claim is informational for clients.
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
