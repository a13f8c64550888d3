//! Router construction for the catalog service.

use crate::handlers::{actors, films, health_check, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::middleware::{require_role, require_session, IdentityResolver, RoleGate};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout applied to every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the catalog router.
///
/// Three tiers: `/health` is open, the read endpoints sit behind the
/// authentication gate, and the mutation endpoints additionally demand the
/// admin role. Both gates resolve identity through the bridge `resolver`.
pub fn routes(state: AppState, resolver: Arc<dyn IdentityResolver>) -> Router {
    let open_routes = Router::new().route("/health", get(health_check));

    let read_routes = Router::new()
        .route("/api/v1/films", get(films::list_films))
        .route("/api/v1/films/search", get(films::search_films))
        .route("/api/v1/actors", get(actors::list_actors));

    let admin_routes = Router::new()
        .route("/api/v1/films/add", post(films::add_film))
        .route("/api/v1/films/edit", post(films::edit_film))
        .route("/api/v1/films/remove", post(films::remove_film))
        .route("/api/v1/actors/add", post(actors::add_actor))
        .route("/api/v1/actors/edit", post(actors::edit_actor))
        .route("/api/v1/actors/remove", post(actors::remove_actor))
        .route_layer(middleware::from_fn_with_state(
            RoleGate::admin(resolver.clone()),
            require_role,
        ));

    // The session gate wraps read and admin routes alike; the role gate
    // above runs after it, reading the context it installs.
    let gated_routes = read_routes
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(resolver, require_session));

    open_routes
        .merge(gated_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
