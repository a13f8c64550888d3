//! Database access layer for the catalog.

pub mod actors;
pub mod films;

use crate::errors::CatalogError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// Fixed delay between startup connectivity probe attempts.
const PROBE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Create the catalog pool and verify connectivity.
///
/// The pool is created lazily, then probed with `SELECT 1` up to
/// `connect_retries` times with a fixed delay between attempts. Exhausting
/// the attempts is a construction error; a half-initialized pool never
/// escapes.
pub async fn connect(database_url: &str, connect_retries: u32) -> Result<PgPool, CatalogError> {
    // Note: never log database_url, it may embed credentials.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
        .map_err(|e| CatalogError::Database(format!("Invalid Postgres URL: {e}")))?;

    let attempts = connect_retries.max(1);
    let mut last_err = String::new();

    for attempt in 1..=attempts {
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => {
                info!(target: "catalog.repositories", attempt, "Postgres connectivity verified");
                return Ok(pool);
            }
            Err(e) => {
                warn!(target: "catalog.repositories", attempt, error = %e, "Postgres probe failed");
                last_err = e.to_string();
            }
        }
        if attempt < attempts {
            tokio::time::sleep(PROBE_RETRY_DELAY).await;
        }
    }

    Err(CatalogError::Database(format!(
        "Postgres unreachable after {attempts} attempts: {last_err}"
    )))
}

/// Maps a write-path sqlx error: constraint violations (a crew id that
/// does not exist, a duplicate link row) are caller-fixable conflicts,
/// anything else is a store fault.
pub(crate) fn write_error(err: sqlx::Error, what: &str) -> CatalogError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.constraint().is_some() => {
            CatalogError::Conflict(format!("{what} violates a catalog constraint"))
        }
        _ => CatalogError::Database(format!("{what} failed: {err}")),
    }
}
