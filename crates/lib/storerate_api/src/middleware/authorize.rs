//! Authorization middleware — per-route role gate.
//!
//! Pure, synchronous check of the identity attached by
//! [`super::auth::require_auth`] against the capability table in
//! `storerate_core::auth::roles`. No I/O.

use axum::{extract::Request, middleware::Next, response::Response};

use storerate_core::auth::roles::{Action, Resource, is_allowed};

use crate::error::ApiError;
use crate::middleware::auth::Identity;

/// Allow the request only if an identity is present and its role may
/// perform `action` on `resource` per the capability table (which grants
/// admin everything and treats an empty role set as "any authenticated
/// identity").
pub async fn require_capability(
    resource: Resource,
    action: Action,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(ApiError::Unauthenticated)?;

    if !is_allowed(identity.role, resource, action) {
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
