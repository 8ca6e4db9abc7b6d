//! Request extractors.
//!
//! Axum's stock `Json` rejects malformed bodies with a plain-text response,
//! which would bypass the error envelope. This wrapper routes rejections
//! through [`ApiError`] so a missing field fails the same way a failed
//! validation does.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor whose rejection is an [`ApiError::Validation`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);
