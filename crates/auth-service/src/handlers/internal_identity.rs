//! Identity bridge handlers, served on the internal listener only.
//!
//! Two resolutions, one endpoint each: session id to user id, user id to
//! role. Every failure mode (unknown session, unknown user, store fault)
//! collapses into a bare 404 so a calling service learns nothing beyond
//! "resolution failed" and must treat it as not authorized.

use crate::errors::AuthError;
use crate::handlers::auth_handler::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use common::types::{Role, UserId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

fn accept<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(target: "auth.handlers.internal", error = %rejection, "Malformed bridge request");
        AuthError::Validation("malformed request body".to_string())
    })
}

/// Resolve a session id to the owning user's id.
///
/// POST /internal/v1/identity/user-id
#[instrument(skip_all, name = "auth.handlers.internal.user_id")]
pub async fn get_user_id(
    State(state): State<AppState>,
    payload: Result<Json<UserIdRequest>, JsonRejection>,
) -> Result<Json<UserIdResponse>, AuthError> {
    let request = accept(payload)?;

    let user_id = state.core.resolve_user_id(&request.session_id).await?;

    Ok(Json(UserIdResponse { user_id }))
}

/// Resolve a user id to the user's role.
///
/// POST /internal/v1/identity/role
#[instrument(skip_all, name = "auth.handlers.internal.role")]
pub async fn get_role(
    State(state): State<AppState>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, AuthError> {
    let request = accept(payload)?;

    let role = state
        .core
        .resolve_role_by_id(request.user_id)
        .await
        .map_err(|e| {
            // Same collapse as the session hop: cause goes to the log,
            // the caller sees only that resolution failed.
            tracing::debug!(target: "auth.handlers.internal", error = %e, "Role resolution failed");
            AuthError::IdentityNotResolved
        })?;

    Ok(Json(RoleResponse { role }))
}
