//! Tests for the internal identity bridge endpoints.
//!
//! One AppState backs both routers, mirroring production: sessions issued
//! through the public surface must resolve through the internal one.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use auth_service::config::MIN_BCRYPT_COST;
use auth_service::handlers::auth_handler::AppState;
use auth_service::repositories::profiles::memory::MemoryProfileStore;
use auth_service::repositories::sessions::memory::MemorySessionStore;
use auth_service::routes;
use auth_service::services::core::AuthCore;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::types::Role;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    profiles: Arc<MemoryProfileStore>,
    public: Router,
    internal: Router,
}

fn harness() -> Harness {
    let profiles = Arc::new(MemoryProfileStore::new());
    let state = AppState {
        core: Arc::new(AuthCore::new(
            profiles.clone(),
            Box::new(MemorySessionStore::new()),
            MIN_BCRYPT_COST,
        )),
    };

    Harness {
        profiles,
        public: routes::public_routes(state.clone()),
        internal: routes::internal_routes(state),
    }
}

async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Signs up and in, returning the issued session id.
async fn issue_session(harness: &Harness, login: &str) -> String {
    let body = format!(r#"{{"login":"{login}","password":"pw"}}"#);
    let (status, _) = post_json(&harness.public, "/signup", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let response = harness
        .public
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/signin")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    pair.strip_prefix("session_id=").unwrap().to_string()
}

#[tokio::test]
async fn test_issued_session_resolves_to_user_id_and_role() {
    let harness = harness();
    let session_id = issue_session(&harness, "alice1").await;

    let (status, body) = post_json(
        &harness.internal,
        "/internal/v1/identity/user-id",
        format!(r#"{{"session_id":"{session_id}"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = body["user_id"].as_i64().unwrap();
    assert!(user_id > 0);

    let (status, body) = post_json(
        &harness.internal,
        "/internal/v1/identity/role",
        format!(r#"{{"user_id":{user_id}}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "standard");

    harness.profiles.set_role("alice1", Role::Admin).await;
    let (status, body) = post_json(
        &harness.internal,
        "/internal/v1/identity/role",
        format!(r#"{{"user_id":{user_id}}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_unknown_session_is_bare_404() {
    let harness = harness();

    let (status, body) = post_json(
        &harness.internal,
        "/internal/v1/identity/user-id",
        r#"{"session_id":"nosuchsession"}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    // No cause detail beyond the generic envelope.
    assert_eq!(body["error"]["code"], "IDENTITY_NOT_RESOLVED");
}

#[tokio::test]
async fn test_unknown_user_role_is_404() {
    let harness = harness();

    let (status, _) = post_json(
        &harness.internal,
        "/internal/v1/identity/role",
        r#"{"user_id":9999}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logged_out_session_no_longer_resolves() {
    let harness = harness();
    let session_id = issue_session(&harness, "alice1").await;

    let (status, _) = post_json(
        &harness.internal,
        "/internal/v1/identity/user-id",
        format!(r#"{{"session_id":"{session_id}"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = harness
        .public
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/logout")
                .header(axum::http::header::COOKIE, format!("session_id={session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = post_json(
        &harness.internal,
        "/internal/v1/identity/user-id",
        format!(r#"{{"session_id":"{session_id}"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bridge_request_is_400() {
    let harness = harness();

    let (status, _) = post_json(
        &harness.internal,
        "/internal/v1/identity/user-id",
        "{not json".to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_public_routes_do_not_serve_bridge() {
    let harness = harness();

    let (status, _) = post_json(
        &harness.public,
        "/internal/v1/identity/user-id",
        r#"{"session_id":"tok"}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
