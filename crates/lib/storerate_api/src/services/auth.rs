//! Authentication flows: register, login, refresh, logout, password change.
//!
//! Handlers stay thin; everything that touches the credential store, the
//! token service, or the registry lives here. bcrypt work runs on the
//! blocking pool so a slow hash never stalls request processing.

use tracing::info;

use storerate_core::auth::password::{check_strength, hash_password, verify_password};
use storerate_core::auth::registry::token_fingerprint;
use storerate_core::auth::roles::Role;
use storerate_core::models::account::{Account, NewAccount};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{AccountDto, AuthResponse, IdentityDto, RefreshResponse, TokenPairDto};

/// Register a new account with the default `user` role.
pub async fn register(
    state: &AppState,
    email: &str,
    username: &str,
    password: &str,
) -> ApiResult<AuthResponse> {
    let mut reasons = Vec::new();
    if email.is_empty() || !email.contains('@') {
        reasons.push("email: must be a valid email address".to_string());
    }
    if username.len() < 3 || username.len() > 30 {
        reasons.push("username: must be 3-30 characters".to_string());
    }
    for reason in check_strength(password) {
        reasons.push(format!("password: {reason}"));
    }
    if !reasons.is_empty() {
        return Err(ApiError::Validation(reasons));
    }

    if state.store.email_exists(email).await? {
        return Err(ApiError::UserAlreadyExists("email".to_string()));
    }
    if state.store.username_exists(username).await? {
        return Err(ApiError::UserAlreadyExists("username".to_string()));
    }

    let password_hash = hash_blocking(state, password).await?;
    let account = state
        .store
        .create(NewAccount {
            email: email.to_string(),
            username: username.to_string(),
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(account_id = %account.id, "account registered");

    let tokens = issue_token_pair(state, &account).await?;
    Ok(AuthResponse {
        account: AccountDto::from(account),
        tokens,
    })
}

/// Authenticate with email or username plus password.
///
/// Unknown identifier and wrong password produce the identical error, so
/// the endpoint cannot be used to enumerate registered emails.
pub async fn login(state: &AppState, identifier: &str, password: &str) -> ApiResult<AuthResponse> {
    let account = state
        .store
        .find_by_login(identifier)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !account.is_active {
        return Err(ApiError::AccountDeactivated);
    }

    if !verify_blocking(password, &account.password_hash).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let tokens = issue_token_pair(state, &account).await?;
    Ok(AuthResponse {
        account: AccountDto::from(account),
        tokens,
    })
}

/// Exchange a refresh token for a new access token, rotating the refresh
/// token when rotation is enabled.
///
/// Both the cryptographic check and the registry check must pass; any
/// failure of either collapses to `InvalidToken` so callers learn nothing
/// about which one failed.
pub async fn refresh(state: &AppState, refresh_token: &str) -> ApiResult<RefreshResponse> {
    let claims = state
        .tokens
        .verify_refresh_token(refresh_token)
        .map_err(|_| ApiError::InvalidToken)?;

    let fingerprint = token_fingerprint(refresh_token);
    if !state.registry.is_valid(&fingerprint).await? {
        return Err(ApiError::InvalidToken);
    }

    let account = state
        .store
        .find_by_id(&claims.sub)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    if !account.is_active {
        return Err(ApiError::AccountDeactivated);
    }

    let access_token = state.tokens.issue_access_token(&account.id, account.role)?;
    let refresh_token = if state.config.rotate_refresh_tokens {
        state.registry.remove(&fingerprint).await?;
        let (rotated, expires_at) = state.tokens.issue_refresh_token(&account.id, account.role)?;
        state
            .registry
            .store(&account.id, &token_fingerprint(&rotated), expires_at)
            .await?;
        rotated
    } else {
        refresh_token.to_string()
    };

    Ok(RefreshResponse {
        tokens: TokenPairDto {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: state.tokens.access_ttl_secs(),
        },
    })
}

/// Invalidate one refresh token. Idempotent: succeeds whether or not the
/// token was still registered.
pub async fn logout(state: &AppState, refresh_token: &str) -> ApiResult<()> {
    state
        .registry
        .remove(&token_fingerprint(refresh_token))
        .await?;
    Ok(())
}

/// Invalidate every refresh token for the authenticated account.
pub async fn logout_all(state: &AppState, account_id: &str) -> ApiResult<()> {
    state.registry.remove_all_for_account(account_id).await?;
    Ok(())
}

/// Fetch the authenticated account's profile.
pub async fn profile(state: &AppState, account_id: &str) -> ApiResult<AccountDto> {
    let account = state
        .store
        .find_by_id(account_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(AccountDto::from(account))
}

/// Change the authenticated account's password. Every refresh token is
/// revoked on success ("log out everywhere").
pub async fn change_password(
    state: &AppState,
    account_id: &str,
    current_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    let account = state
        .store
        .find_by_id(account_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_blocking(current_password, &account.password_hash).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let reasons = check_strength(new_password);
    if !reasons.is_empty() {
        return Err(ApiError::Validation(
            reasons.into_iter().map(|r| format!("password: {r}")).collect(),
        ));
    }

    let hash = hash_blocking(state, new_password).await?;
    state.store.update_password_hash(&account.id, &hash).await?;
    state.registry.remove_all_for_account(&account.id).await?;

    info!(account_id = %account.id, "password changed, sessions revoked");
    Ok(())
}

/// Admin: flip an account's active flag. Deactivation also revokes every
/// outstanding refresh token so revocation is immediate, not just at the
/// next active-flag check.
pub async fn set_account_active(
    state: &AppState,
    account_id: &str,
    active: bool,
) -> ApiResult<AccountDto> {
    state.store.set_active(account_id, active).await?;
    if !active {
        state.registry.remove_all_for_account(account_id).await?;
        info!(%account_id, "account deactivated, sessions revoked");
    }
    let account = state
        .store
        .find_by_id(account_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(AccountDto::from(account))
}

/// Identity as attached by the authentication middleware.
pub fn identity_dto(identity: &crate::middleware::auth::Identity) -> IdentityDto {
    IdentityDto {
        id: identity.account_id.clone(),
        role: identity.role,
    }
}

async fn issue_token_pair(state: &AppState, account: &Account) -> ApiResult<TokenPairDto> {
    let access_token = state.tokens.issue_access_token(&account.id, account.role)?;
    let (refresh_token, expires_at) = state.tokens.issue_refresh_token(&account.id, account.role)?;
    state
        .registry
        .store(&account.id, &token_fingerprint(&refresh_token), expires_at)
        .await?;
    Ok(TokenPairDto {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.tokens.access_ttl_secs(),
    })
}

async fn hash_blocking(state: &AppState, password: &str) -> ApiResult<String> {
    let password = password.to_string();
    let cost = state.config.bcrypt_cost;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task: {e}")))??;
    Ok(hash)
}

async fn verify_blocking(password: &str, hash: &str) -> ApiResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task: {e}")))
}
