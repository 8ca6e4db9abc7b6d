//! API request/response types.

use serde::{Deserialize, Serialize};

use storerate_core::auth::roles::Role;
use storerate_core::models::account::Account;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// Account as exposed to clients. Built from the domain model; the password
/// hash has no representation here at all.
#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            username: a.username,
            role: a.role,
            is_active: a.is_active,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Register/login success payload.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub account: AccountDto,
    pub tokens: TokenPairDto,
}

/// Refresh success payload.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub tokens: TokenPairDto,
}

/// Identity payload for `GET /auth/verify`.
#[derive(Debug, Serialize)]
pub struct IdentityDto {
    pub id: String,
    pub role: Role,
}
