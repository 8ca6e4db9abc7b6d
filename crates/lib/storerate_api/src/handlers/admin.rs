//! Admin account-management handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::Json;
use crate::models::SetActiveRequest;
use crate::response::ok;
use crate::services::auth;

/// `PUT /admin/accounts/{id}/active` — activate or deactivate an account.
/// Deactivation revokes all of the account's refresh tokens.
pub async fn set_account_active_handler(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(body): Json<SetActiveRequest>,
) -> ApiResult<impl IntoResponse> {
    let resp = auth::set_account_active(&state, &account_id, body.active).await?;
    Ok(ok(resp))
}
