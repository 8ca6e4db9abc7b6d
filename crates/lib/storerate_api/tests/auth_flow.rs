//! End-to-end auth flows over the router with in-memory backends.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use storerate_api::config::ApiConfig;
use storerate_api::{AppState, router};
use storerate_core::auth::password::hash_password;
use storerate_core::auth::registry::InMemoryRegistry;
use storerate_core::auth::roles::Role;
use storerate_core::auth::token::{TokenConfig, TokenService};
use storerate_core::models::account::Account;
use storerate_core::store::CredentialStore;
use storerate_core::store::memory::MemoryCredentialStore;
use storerate_core::uuid::uuidv7;

// Low bcrypt cost keeps the suite fast; production default is 12.
const TEST_BCRYPT_COST: u32 = 4;

const GOOD_PASSWORD: &str = "Abc12345!";

fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: "postgres://unused".into(),
        access_secret: "test-access-secret".into(),
        refresh_secret: "test-refresh-secret".into(),
        access_ttl: Duration::hours(1),
        refresh_ttl: Duration::days(7),
        issuer: "storerate".into(),
        audience: "storerate-clients".into(),
        bcrypt_cost: TEST_BCRYPT_COST,
        rotate_refresh_tokens: true,
        sweep_interval: std::time::Duration::from_secs(3600),
    }
}

struct TestApp {
    app: Router,
    store: Arc<MemoryCredentialStore>,
    config: ApiConfig,
}

fn test_app() -> TestApp {
    test_app_with(test_config())
}

fn test_app_with(config: ApiConfig) -> TestApp {
    let store = Arc::new(MemoryCredentialStore::new());
    let tokens = Arc::new(TokenService::new(config.token_config()).expect("token service"));
    let state = AppState {
        store: store.clone(),
        registry: Arc::new(InMemoryRegistry::new()),
        tokens,
        config: config.clone(),
    };
    TestApp {
        app: router(state),
        store,
        config,
    }
}

fn seed_account(store: &MemoryCredentialStore, email: &str, username: &str, role: Role) -> Account {
    let account = Account {
        id: uuidv7().to_string(),
        email: email.to_string(),
        username: username.to_string(),
        password_hash: hash_password(GOOD_PASSWORD, TEST_BCRYPT_COST).expect("hash"),
        role,
        is_active: true,
        created_at: Utc::now(),
    };
    store.seed(account.clone());
    account
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

fn error_code(body: &Value) -> &str {
    assert_eq!(body["success"], false, "expected failure envelope: {body}");
    body["error"]["code"].as_str().expect("error code")
}

async fn register(app: &Router, email: &str, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/register",
        Some(json!({ "email": email, "username": username, "password": password })),
        None,
    )
    .await
}

async fn login(app: &Router, identifier: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/login",
        Some(json!({ "identifier": identifier, "password": password })),
        None,
    )
    .await
}

#[tokio::test]
async fn register_returns_account_and_tokens_without_hash() {
    let t = test_app();
    let (status, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let account = &body["data"]["account"];
    assert_eq!(account["email"], "a@x.com");
    assert_eq!(account["username"], "alice");
    assert_eq!(account["role"], "user");
    assert_eq!(account["is_active"], true);
    assert!(account.get("password").is_none());
    assert!(account.get("password_hash").is_none());

    let tokens = &body["data"]["tokens"];
    assert!(!tokens["access_token"].as_str().unwrap().is_empty());
    assert!(!tokens["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 3600);
}

#[tokio::test]
async fn register_rejects_duplicates_with_conflict() {
    let t = test_app();
    register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    let (status, body) = register(&t.app, "a@x.com", "alice2", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "UserAlreadyExists");

    let (status, body) = register(&t.app, "b@x.com", "alice", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "UserAlreadyExists");
}

#[tokio::test]
async fn register_reports_all_password_violations() {
    let t = test_app();
    let (status, body) = register(&t.app, "a@x.com", "alice", "abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "ValidationError");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("at least 8"));
    assert!(message.contains("uppercase"));
    assert!(message.contains("digit"));
}

#[tokio::test]
async fn malformed_body_gets_validation_envelope() {
    // A body missing required fields must produce the standard error
    // envelope, not axum's plain-text rejection.
    let t = test_app();
    let (status, body) = send(&t.app, "POST", "/auth/login", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "ValidationError");
    assert!(!body["error"]["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_succeeds_then_fails_on_wrong_password() {
    let t = test_app();
    register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    let (status, body) = login(&t.app, "a@x.com", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["tokens"]["access_token"].as_str().unwrap().is_empty());

    let (status, body) = login(&t.app, "a@x.com", "Wrong1234!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidCredentials");
}

#[tokio::test]
async fn login_accepts_username_as_identifier() {
    let t = test_app();
    register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    let (status, _) = login(&t.app, "alice", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_identifier_matches_wrong_password_error() {
    let t = test_app();
    register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    let (status_unknown, body_unknown) = login(&t.app, "nobody@x.com", GOOD_PASSWORD).await;
    let (status_wrong, body_wrong) = login(&t.app, "a@x.com", "Wrong1234!").await;

    assert_eq!(status_unknown, status_wrong);
    assert_eq!(body_unknown, body_wrong);
}

#[tokio::test]
async fn deactivated_account_cannot_login() {
    let t = test_app();
    let account = seed_account(&t.store, "a@x.com", "alice", Role::User);
    t.store.set_active(&account.id, false).await.unwrap();

    let (status, body) = login(&t.app, "a@x.com", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AccountDeactivated");
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_old_token() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let old_refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": old_refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, old_refresh);

    // The rotated-out token is dead.
    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": old_refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");

    // The rotated-in token works.
    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": new_refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_rotation_keeps_token_alive() {
    let mut config = test_config();
    config.rotate_refresh_tokens = false;
    let t = test_app_with(config);

    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, body) = send(
            &t.app,
            "POST",
            "/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["tokens"]["refresh_token"].as_str().unwrap(),
            refresh
        );
    }
}

#[tokio::test]
async fn logout_is_idempotent_and_kills_refresh() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, body) = send(
            &t.app,
            "POST",
            "/auth/logout",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");
}

#[tokio::test]
async fn logout_all_revokes_every_device() {
    let t = test_app();
    register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;

    let (_, phone) = login(&t.app, "alice", GOOD_PASSWORD).await;
    let (_, laptop) = login(&t.app, "alice", GOOD_PASSWORD).await;
    let access = phone["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(&t.app, "POST", "/auth/logout-all", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);

    for body in [&phone, &laptop] {
        let refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap();
        let (status, body) = send(
            &t.app,
            "POST",
            "/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "InvalidToken");
    }
}

#[tokio::test]
async fn profile_requires_and_honors_bearer_token() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&t.app, "GET", "/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "Unauthenticated");

    let (status, body) = send(&t.app, "GET", "/auth/profile", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn malformed_authorization_scheme_is_unauthenticated() {
    let t = test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/auth/profile")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_access_token_is_invalid_token() {
    let t = test_app();
    let (status, body) = send(&t.app, "GET", "/auth/verify", None, Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");
}

#[tokio::test]
async fn expired_access_token_reports_expired() {
    let t = test_app();
    let account = seed_account(&t.store, "a@x.com", "alice", Role::User);

    // Same secrets, negative access lifetime: cryptographically valid but
    // already past expiry.
    let expired_issuer = TokenService::new(TokenConfig {
        access_ttl: Duration::seconds(-60),
        ..t.config.token_config()
    })
    .unwrap();
    let stale = expired_issuer
        .issue_access_token(&account.id, account.role)
        .unwrap();

    let (status, body) = send(&t.app, "GET", "/auth/profile", None, Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "Expired");
}

#[tokio::test]
async fn verify_returns_fresh_identity() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    let id = body["data"]["account"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&t.app, "GET", "/auth/verify", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn deactivation_cuts_off_live_access_tokens() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    let id = body["data"]["account"]["id"].as_str().unwrap().to_string();

    t.store.set_active(&id, false).await.unwrap();

    // The token itself is still cryptographically valid, but the per-request
    // account re-check rejects it.
    let (status, body) = send(&t.app, "GET", "/auth/profile", None, Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AccountDeactivated");
}

#[tokio::test]
async fn admin_route_enforces_role() {
    let t = test_app();
    seed_account(&t.store, "admin@x.com", "root", Role::Admin);
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let user_access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    let user_id = body["data"]["account"]["id"].as_str().unwrap().to_string();

    let uri = format!("/admin/accounts/{user_id}/active");

    let (status, body) = send(
        &t.app,
        "PUT",
        &uri,
        Some(json!({ "active": false })),
        Some(&user_access),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "Forbidden");

    let (_, body) = login(&t.app, "admin@x.com", GOOD_PASSWORD).await;
    let admin_access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "PUT",
        &uri,
        Some(json!({ "active": false })),
        Some(&admin_access),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
async fn admin_deactivation_revokes_refresh_tokens() {
    let t = test_app();
    seed_account(&t.store, "admin@x.com", "root", Role::Admin);
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let user_refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();
    let user_id = body["data"]["account"]["id"].as_str().unwrap().to_string();

    let (_, body) = login(&t.app, "admin@x.com", GOOD_PASSWORD).await;
    let admin_access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &t.app,
        "PUT",
        &format!("/admin/accounts/{user_id}/active"),
        Some(json!({ "active": false })),
        Some(&admin_access),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": user_refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");
}

#[tokio::test]
async fn password_change_revokes_sessions_and_requires_current() {
    let t = test_app();
    let (_, body) = register(&t.app, "a@x.com", "alice", GOOD_PASSWORD).await;
    let access = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();

    // Wrong current password is rejected.
    let (status, body) = send(
        &t.app,
        "PUT",
        "/auth/password",
        Some(json!({ "current_password": "Wrong1234!", "new_password": "Xyz98765?" })),
        Some(&access),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidCredentials");

    let (status, _) = send(
        &t.app,
        "PUT",
        "/auth/password",
        Some(json!({ "current_password": GOOD_PASSWORD, "new_password": "Xyz98765?" })),
        Some(&access),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // All refresh tokens are gone.
    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/refresh",
        Some(json!({ "refresh_token": refresh })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Old password no longer logs in; the new one does.
    let (status, _) = login(&t.app, "alice", GOOD_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&t.app, "alice", "Xyz98765?").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let t = test_app();
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}
