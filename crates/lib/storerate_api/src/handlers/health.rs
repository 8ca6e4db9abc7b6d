//! Liveness probe.

use axum::response::IntoResponse;
use serde::Serialize;

use crate::response::ok;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health` — process is up and serving.
pub async fn health_handler() -> impl IntoResponse {
    ok(HealthResponse {
        status: "ok",
        version: storerate_core::version(),
    })
}
