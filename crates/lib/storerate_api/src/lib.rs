//! # storerate_api
//!
//! HTTP API library for StoreRate.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};

use storerate_core::auth::registry::RefreshTokenRegistry;
use storerate_core::auth::roles::{Action, Resource};
use storerate_core::auth::token::TokenService;
use storerate_core::store::CredentialStore;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account lookup and mutation backend.
    pub store: Arc<dyn CredentialStore>,
    /// Refresh-token revocation registry.
    pub registry: Arc<dyn RefreshTokenRegistry>,
    /// Token issue/verify service.
    pub tokens: Arc<TokenService>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `storerate_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    storerate_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required). Logout is public by design: it only
    // carries a refresh token in the body and is idempotent.
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (any authenticated identity).
    let protected = Router::new()
        .route("/auth/logout-all", post(auth::logout_all_handler))
        .route("/auth/profile", get(auth::profile_handler))
        .route("/auth/verify", get(auth::verify_handler))
        .route("/auth/password", put(auth::change_password_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes: account management per the capability table.
    let admin = Router::new()
        .route(
            "/admin/accounts/{id}/active",
            put(admin::set_account_active_handler),
        )
        .layer(axum::middleware::from_fn(
            |req: axum::extract::Request, next: axum::middleware::Next| {
                middleware::authorize::require_capability(
                    Resource::Account,
                    Action::Manage,
                    req,
                    next,
                )
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .layer(cors)
        .with_state(state)
}
