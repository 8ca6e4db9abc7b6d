//! Authentication middleware — bearer token extraction, verification, and
//! account re-resolution.
//!
//! The account is re-read on every request so role changes and
//! deactivations take effect before the token expires; the identity
//! attached downstream carries the freshly read role, not the token's
//! embedded one.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use storerate_core::auth::roles::Role;

use crate::AppState;
use crate::error::ApiError;

/// Identity attached to request extensions after authentication.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: String,
    /// Current role from the credential store, not the token claim.
    pub role: Role,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// access token, re-resolves the account, and injects [`Identity`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .tokens
        .verify_access_token(token)
        .map_err(storerate_core::auth::AuthError::from)?;

    // A token can outlive a deactivation or role change; the store is the
    // source of truth, the claims only name the subject.
    let account = state
        .store
        .find_by_id(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !account.is_active {
        return Err(ApiError::AccountDeactivated);
    }

    request.extensions_mut().insert(Identity {
        account_id: account.id,
        role: account.role,
    });

    Ok(next.run(request).await)
}
