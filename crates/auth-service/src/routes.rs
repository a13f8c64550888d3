//! Router construction for the public and internal listeners.

use crate::handlers::auth_handler::{self, AppState};
use crate::handlers::{health_check, internal_identity};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::middleware::{require_session, IdentityResolver};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout applied to every route on both listeners.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the public router: signup, signin, logout, health.
///
/// Only `/logout` sits behind the authentication gate; it resolves the
/// cookie through the in-process core rather than over the bridge.
pub fn public_routes(state: AppState) -> Router {
    let resolver: Arc<dyn IdentityResolver> = state.core.clone();

    let open_routes = Router::new()
        .route("/signin", post(auth_handler::signin))
        .route("/signup", post(auth_handler::signup))
        .route("/health", get(health_check));

    let gated_routes = Router::new()
        .route("/logout", post(auth_handler::logout))
        .route_layer(middleware::from_fn_with_state(resolver, require_session));

    open_routes
        .merge(gated_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Build the internal router: the identity bridge plus health.
///
/// Bound on the internal listener only; never exposed to clients.
pub fn internal_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/internal/v1/identity/user-id",
            post(internal_identity::get_user_id),
        )
        .route(
            "/internal/v1/identity/role",
            post(internal_identity::get_role),
        )
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
