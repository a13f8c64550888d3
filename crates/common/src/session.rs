//! Session cookie codec.
//!
//! Sessions travel between browser and services in a single cookie. The
//! auth service issues it on signin and clears it on logout; the catalog
//! service only ever reads it. Everything about the cookie's shape lives
//! here so the two sides cannot drift apart.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};

/// Name of the authentication cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Formats a timestamp as an RFC 7231 IMF-fixdate (`Sun, 06 Nov 1994
/// 08:49:37 GMT`), the only form `Expires` accepts.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Builds the `Set-Cookie` value that installs a session.
///
/// The attribute set is fixed: `Path=/` so every route sees it, `Expires`
/// matching the server-side session expiry, and `HttpOnly` to keep scripts
/// away from the token.
#[must_use]
pub fn session_cookie(session_id: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "{SESSION_COOKIE}={session_id}; Path=/; Expires={}; HttpOnly",
        http_date(expires_at)
    )
}

/// Builds the `Set-Cookie` value that clears the session cookie.
///
/// Empty value plus an `Expires` one day in the past, which every browser
/// treats as an immediate delete.
#[must_use]
pub fn expired_session_cookie() -> String {
    format!(
        "{SESSION_COOKIE}=; Path=/; Expires={}; HttpOnly",
        http_date(Utc::now() - Duration::days(1))
    )
}

/// Extracts the session id from a raw `Cookie` header value.
///
/// Returns `None` when the cookie is absent or has an empty value (a
/// cleared cookie replayed by a client counts as no session).
#[must_use]
pub fn session_id_from_cookie_header(header: &str) -> Option<&str> {
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(SESSION_COOKIE) {
            match parts.next() {
                Some(value) if !value.is_empty() => return Some(value),
                _ => return None,
            }
        }
    }
    None
}

/// Extracts the session id from request headers.
#[must_use]
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    session_id_from_cookie_header(header).map(str::to_string)
}
