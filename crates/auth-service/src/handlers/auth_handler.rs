//! Public authentication handlers: signup, signin, logout.

use crate::errors::AuthError;
use crate::services::core::AuthCore;
use axum::extract::rejection::JsonRejection;
use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use common::middleware::AuthContext;
use common::session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Application state shared across handlers on both listeners.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AuthCore>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}

/// A body that fails to parse is a 400 regardless of which axum rejection
/// fired; the default split (415 for a missing content type, 422 for type
/// mismatches) leaks parser internals the API does not promise.
fn accept<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(target: "auth.handlers", error = %rejection, "Malformed request body");
            Err(AuthError::Validation("malformed request body".to_string()))
        }
    }
}

/// Handle signup.
///
/// POST /signup
#[instrument(skip_all, name = "auth.handlers.signup")]
pub async fn signup(
    axum::extract::State(state): axum::extract::State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let request = accept(payload)?;

    state.core.signup(&request.login, &request.password).await?;

    Ok(StatusResponse::ok().into_response())
}

/// Handle signin.
///
/// POST /signin - on success the session cookie rides on the response.
#[instrument(skip_all, name = "auth.handlers.signin")]
pub async fn signin(
    axum::extract::State(state): axum::extract::State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let request = accept(payload)?;

    let session = state.core.signin(&request.login, &request.password).await?;

    let cookie = session::session_cookie(&session.session_id, session.expires_at);
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| AuthError::Crypto(format!("Unencodable cookie value: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((StatusCode::OK, headers, StatusResponse::ok()).into_response())
}

/// Handle logout.
///
/// POST /logout - runs behind the authentication gate, so the session id
/// arrives through [`AuthContext`]. The response clears the cookie with a
/// backdated replacement.
#[instrument(skip_all, name = "auth.handlers.logout")]
pub async fn logout(
    axum::extract::State(state): axum::extract::State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response, AuthError> {
    state.core.logout(&ctx.session_id).await?;

    let cookie = HeaderValue::from_str(&session::expired_session_cookie())
        .map_err(|e| AuthError::Crypto(format!("Unencodable cookie value: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((StatusCode::OK, headers, StatusResponse::ok()).into_response())
}
