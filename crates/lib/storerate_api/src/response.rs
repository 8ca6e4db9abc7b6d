//! Response envelope.
//!
//! Every response body is `{ success, data?, error? }`; failure bodies are
//! built by [`crate::error::ApiError`].

use axum::Json;
use serde::Serialize;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
    })
}

/// Success envelope with no payload (logout and friends).
pub fn ok_empty() -> Json<Envelope<()>> {
    Json(Envelope {
        success: true,
        data: None,
    })
}
