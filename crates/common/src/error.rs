//! Shared HTTP error envelope.
//!
//! Every Marquee surface answers failures with the same JSON shape:
//!
//! ```json
//! { "error": { "code": "NOT_FOUND", "message": "film not found" } }
//! ```
//!
//! Service crates map their own `thiserror` enums onto this envelope in
//! their `IntoResponse` impls; the gates in [`crate::middleware`] emit it
//! directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Top-level error payload: `{ "error": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error body.
    pub error: ErrorBody,
}

/// Machine-readable code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable, SCREAMING_SNAKE_CASE error code.
    pub code: String,
    /// Short description safe to show to clients.
    pub message: String,
}

impl ErrorEnvelope {
    /// Builds an envelope from a code/message pair.
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Builds the canonical error response for a status/code/message triple.
#[must_use]
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorEnvelope::new(code, message))).into_response()
}
