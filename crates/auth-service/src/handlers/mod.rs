//! HTTP request handlers.

pub mod auth_handler;
pub mod internal_identity;

/// Liveness probe, served on both listeners.
pub async fn health_check() -> &'static str {
    "OK"
}
