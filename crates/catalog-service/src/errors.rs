//! Catalog service error types.
//!
//! Same shape as the auth service's errors: one `thiserror` enum mapped to
//! the shared envelope, generic client messages, full cause logged
//! server-side for 5xx.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::error_response;
use thiserror::Error;

/// Catalog service error type.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl CatalogError {
    /// Returns the HTTP status code for this error (for tests and logging).
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 400,
            CatalogError::NotFound(_) => 404,
            CatalogError::Conflict(_) => 409,
            CatalogError::Database(_) | CatalogError::Internal => 500,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            CatalogError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.clone())
            }
            CatalogError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} not found"),
            ),
            CatalogError::Conflict(reason) => {
                (StatusCode::CONFLICT, "CONFLICT", reason.clone())
            }
            CatalogError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "catalog.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            CatalogError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        error_response(status, code, message)
    }
}

/// Convert sqlx errors to CatalogError.
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CatalogError::NotFound("record"),
            other => CatalogError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::error::ErrorEnvelope;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(CatalogError::Validation("x".to_string()).status_code(), 400);
        assert_eq!(CatalogError::NotFound("film").status_code(), 404);
        assert_eq!(CatalogError::Conflict("x".to_string()).status_code(), 409);
        assert_eq!(CatalogError::Database("x".to_string()).status_code(), 500);
        assert_eq!(CatalogError::Internal.status_code(), 500);
    }

    #[test]
    fn test_display_not_found_names_entity() {
        assert_eq!(format!("{}", CatalogError::NotFound("film")), "film not found");
    }

    #[tokio::test]
    async fn test_database_error_body_is_generic() {
        let response =
            CatalogError::Database("password=hunter2 leaked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let envelope: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.error.code, "DATABASE_ERROR");
        assert!(!envelope.error.message.contains("hunter2"));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error = CatalogError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, CatalogError::NotFound(_)));
    }
}
