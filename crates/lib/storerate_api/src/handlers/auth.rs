//! Authentication request handlers.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::Json;
use crate::middleware::auth::Identity;
use crate::models::{
    ChangePasswordRequest, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
};
use crate::response::{ok, ok_empty};
use crate::services::auth;

/// `POST /auth/register` — create an account, returning it with a token pair.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let resp = auth::register(&state, &body.email, &body.username, &body.password).await?;
    Ok((StatusCode::CREATED, ok(resp)))
}

/// `POST /auth/login` — authenticate with email/username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let resp = auth::login(&state, &body.identifier, &body.password).await?;
    Ok(ok(resp))
}

/// `POST /auth/refresh` — exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let resp = auth::refresh(&state, &body.refresh_token).await?;
    Ok(ok(resp))
}

/// `POST /auth/logout` — revoke one refresh token. Idempotent.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> ApiResult<impl IntoResponse> {
    auth::logout(&state, &body.refresh_token).await?;
    Ok(ok_empty())
}

/// `POST /auth/logout-all` — revoke every refresh token of the caller.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    auth::logout_all(&state, &identity.account_id).await?;
    Ok(ok_empty())
}

/// `GET /auth/profile` — the caller's account, sans credentials.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let resp = auth::profile(&state, &identity.account_id).await?;
    Ok(ok(resp))
}

/// `GET /auth/verify` — echo the authenticated identity.
pub async fn verify_handler(
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    Ok(ok(auth::identity_dto(&identity)))
}

/// `PUT /auth/password` — self-service password change.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    auth::change_password(
        &state,
        &identity.account_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(ok_empty())
}
