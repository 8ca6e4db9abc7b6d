//! Credential store adapter.
//!
//! The auth core only ever needs a handful of account operations; the
//! trait keeps the relational store swappable (Postgres in production,
//! in-memory for tests and demos).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::auth::AuthError;
use crate::models::account::{Account, NewAccount};

/// Lookup and mutation contract the auth flows depend on.
///
/// Identifier comparisons (email, username) are literal, not
/// case-normalized; changing that changes observable uniqueness semantics.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve an account by login identifier (email or username).
    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AuthError>;

    /// Resolve an account by id. Called on every authenticated request to
    /// pick up role changes and deactivations before token expiry.
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Persist a new account, returning it with its assigned id.
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;

    /// Replace the password hash (self-service password change).
    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), AuthError>;

    /// Flip the active flag. Fails with `NotFound` for unknown ids.
    async fn set_active(&self, id: &str, active: bool) -> Result<(), AuthError>;
}
