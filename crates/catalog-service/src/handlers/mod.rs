//! HTTP request handlers.

pub mod actors;
pub mod films;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::errors::CatalogError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

/// Liveness probe.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Body of every successful mutation response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub(crate) fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}

/// `page`/`size` query parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

impl Pagination {
    /// Resolves to a SQL `(limit, offset)` pair.
    ///
    /// Pages are 1-based; out-of-range values clamp rather than error so a
    /// sloppy client still gets a sensible page. The offset saturates, so a
    /// huge `page` yields an empty page instead of overflowing.
    #[must_use]
    pub fn limit_offset(self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (size, page.saturating_sub(1).saturating_mul(size))
    }
}

/// A body that fails to parse is a 400 regardless of which axum rejection
/// fired; the default split (415 for a missing content type, 422 for type
/// mismatches) leaks parser internals the API does not promise.
pub(crate) fn accept<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, CatalogError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(target: "catalog.handlers", error = %rejection, "Malformed request body");
            Err(CatalogError::Validation("malformed request body".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let pagination = Pagination {
            page: None,
            size: None,
        };
        assert_eq!(pagination.limit_offset(), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_pagination_offsets_by_page() {
        let pagination = Pagination {
            page: Some(3),
            size: Some(25),
        };
        assert_eq!(pagination.limit_offset(), (25, 50));
    }

    #[test]
    fn test_pagination_clamps_out_of_range() {
        let pagination = Pagination {
            page: Some(0),
            size: Some(10_000),
        };
        assert_eq!(pagination.limit_offset(), (MAX_PAGE_SIZE, 0));

        let pagination = Pagination {
            page: Some(-2),
            size: Some(0),
        };
        assert_eq!(pagination.limit_offset(), (1, 0));
    }

    #[test]
    fn test_pagination_huge_page_saturates_instead_of_overflowing() {
        let pagination = Pagination {
            page: Some(i64::MAX),
            size: Some(100),
        };

        let (limit, offset) = pagination.limit_offset();
        assert_eq!(limit, 100);
        // Saturated, never wrapped: the offset stays a valid OFFSET value.
        assert_eq!(offset, i64::MAX);

        let (_, offset) = Pagination {
            page: Some(i64::MAX),
            size: Some(1),
        }
        .limit_offset();
        assert_eq!(offset, i64::MAX - 1);
    }
}
