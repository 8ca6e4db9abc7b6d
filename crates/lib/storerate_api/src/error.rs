//! Application error types.
//!
//! Every failure surfaces as a stable string code in the response envelope;
//! internal detail is logged, never leaked.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use storerate_core::auth::AuthError;

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application-level errors with HTTP status and error-code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account deactivated")]
    AccountDeactivated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} already registered")]
    UserAlreadyExists(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(String),
}

/// Failure body: `{ success: false, error: { code, message } }`.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Stable error code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::InvalidCredentials => "InvalidCredentials",
            ApiError::AccountDeactivated => "AccountDeactivated",
            ApiError::InvalidToken => "InvalidToken",
            ApiError::Expired => "Expired",
            ApiError::Unauthenticated => "Unauthenticated",
            ApiError::Forbidden => "Forbidden",
            ApiError::UserAlreadyExists(_) => "UserAlreadyExists",
            ApiError::NotFound => "NotFound",
            ApiError::Internal(_) => "InternalError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::AccountDeactivated
            | ApiError::InvalidToken
            | ApiError::Expired
            | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(reasons) => reasons.join("; "),
            ApiError::Internal(detail) => {
                error!(%detail, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code(),
                message,
            },
        });
        (self.status(), body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::AccountDeactivated => ApiError::AccountDeactivated,
            AuthError::InvalidToken => ApiError::InvalidToken,
            AuthError::TokenExpired => ApiError::Expired,
            AuthError::Unauthenticated => ApiError::Unauthenticated,
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::AlreadyExists(field) => ApiError::UserAlreadyExists(field),
            AuthError::Validation(reasons) => ApiError::Validation(reasons),
            AuthError::NotFound => ApiError::NotFound,
            AuthError::Db(e) => ApiError::Internal(e.to_string()),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Body extraction failures (malformed JSON, missing fields, wrong
/// content type) surface as validation errors so clients always get the
/// standard envelope.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ApiError::InvalidCredentials.code(), "InvalidCredentials");
        assert_eq!(ApiError::Expired.code(), "Expired");
        assert_eq!(ApiError::Internal("boom".into()).code(), "InternalError");
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let resp = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_error_maps_to_same_taxonomy() {
        assert!(matches!(
            ApiError::from(AuthError::TokenExpired),
            ApiError::Expired
        ));
        assert!(matches!(
            ApiError::from(AuthError::AlreadyExists("email".into())),
            ApiError::UserAlreadyExists(_)
        ));
    }
}
