//! Auth service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl, using
//! the shared envelope from `common::error`. Messages returned to clients
//! are intentionally generic; the actual cause of 5xx errors is logged
//! server-side. Credential failures share one fixed body so an unknown
//! login and a wrong password are indistinguishable on the wire.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::error_response;
use thiserror::Error;

/// Auth service error type.
///
/// The storage layer distinguishes `ProfileNotFound` from
/// `InvalidCredential`; the service layer collapses both into
/// `InvalidCredentials` before anything reaches a handler. The
/// `IntoResponse` impl maps all three onto the same 401 body, so the
/// distinction can never leak even if a collapse is missed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login already exists")]
    AlreadyExists,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Identity not resolved")]
    IdentityNotResolved,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    /// Returns the HTTP status code for this error (for tests and logging).
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::InvalidCredential
            | AuthError::InvalidCredentials
            | AuthError::AlreadyExists
            | AuthError::SessionNotFound => 401,
            AuthError::ProfileNotFound | AuthError::IdentityNotResolved => 404,
            AuthError::Database(_)
            | AuthError::SessionStore(_)
            | AuthError::Crypto(_)
            | AuthError::Internal => 500,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.clone())
            }
            // One body for every credential failure; see type-level docs.
            AuthError::InvalidCredential | AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid login or password".to_string(),
            ),
            AuthError::AlreadyExists => (
                StatusCode::UNAUTHORIZED,
                "ALREADY_EXISTS",
                "Login is already taken".to_string(),
            ),
            AuthError::SessionNotFound => (
                StatusCode::UNAUTHORIZED,
                "SESSION_NOT_FOUND",
                "No active session".to_string(),
            ),
            AuthError::ProfileNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Profile not found".to_string(),
            ),
            AuthError::IdentityNotResolved => (
                StatusCode::NOT_FOUND,
                "IDENTITY_NOT_RESOLVED",
                "Unknown session or user".to_string(),
            ),
            AuthError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "auth.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AuthError::SessionStore(err) => {
                tracing::error!(target: "auth.sessions", error = %err, "Session store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_STORE_ERROR",
                    "An internal session store error occurred".to_string(),
                )
            }
            AuthError::Crypto(err) => {
                tracing::error!(target: "auth.crypto", error = %err, "Cryptographic operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CRYPTO_ERROR",
                    "An internal cryptographic error occurred".to_string(),
                )
            }
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        error_response(status, code, message)
    }
}

/// Convert sqlx errors to AuthError.
///
/// `RowNotFound` marks a lookup that missed, every other sqlx failure is a
/// database fault.
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AuthError::ProfileNotFound,
            other => AuthError::Database(other.to_string()),
        }
    }
}
