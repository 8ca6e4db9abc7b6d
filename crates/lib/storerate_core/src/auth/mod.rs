//! Authentication and authorization logic.
//!
//! Provides password hashing, token issue/verify, the refresh-token
//! registry, and the role capability table shared by `storerate_api`.

pub mod password;
pub mod registry;
pub mod roles;
pub mod token;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong identifier or wrong password. Deliberately one variant so
    /// callers cannot leak which of the two was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account deactivated")]
    AccountDeactivated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("No credentials presented")]
    Unauthenticated,

    #[error("Insufficient role")]
    Forbidden,

    #[error("{0} already registered")]
    AlreadyExists(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
