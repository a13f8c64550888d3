//! Access middleware chain for session-gated routes.
//!
//! Provides two middleware functions:
//! - `require_session` - authentication gate: resolves the session cookie to
//!   a user id and injects [`AuthContext`] into request extensions
//! - `require_role` - permission gate: checks the authenticated user's role
//!   against the role a route demands
//!
//! Both gates short-circuit: a request that fails a gate is answered
//! immediately (401/403 with the standard error envelope) and never reaches
//! a handler. The gates run over an [`IdentityResolver`] trait object, so
//! the auth service can gate with its in-process core while the catalog
//! service gates through the identity bridge client.

use crate::error::error_response;
use crate::session;
use crate::types::{Role, UserId};
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Resolves session ids and user ids to identity facts.
///
/// Failures are deliberately indistinguishable from "no such session" /
/// "no such user": implementations collapse transport errors, timeouts and
/// lookups that miss into `None`, and the gates answer 401/403 without
/// cause detail. The underlying cause belongs in the implementation's log.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves an active session id to the owning user's id.
    async fn resolve_user_id(&self, session_id: &str) -> Option<UserId>;

    /// Resolves a user id to the user's role.
    async fn resolve_role(&self, user_id: UserId) -> Option<Role>;
}

/// Identity facts the authentication gate attaches to a request.
#[derive(Clone)]
pub struct AuthContext {
    /// The session id the request authenticated with.
    pub session_id: String,
    /// The user the session belongs to.
    pub user_id: UserId,
}

// Session ids must never reach log output, so Debug redacts the token.
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("session_id", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// State for the permission gate: which role the route demands.
#[derive(Clone)]
pub struct RoleGate {
    /// Resolver shared with the authentication gate.
    pub resolver: Arc<dyn IdentityResolver>,
    /// Role a request must hold to pass.
    pub required: Role,
}

impl RoleGate {
    /// Gate requiring the admin role.
    #[must_use]
    pub fn admin(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            resolver,
            required: Role::Admin,
        }
    }
}

fn unauthorized() -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "authentication required",
    )
}

/// Authentication gate.
///
/// Extracts the session cookie and resolves it to a user id. A missing
/// cookie or a session that does not resolve answers 401 immediately; on
/// success the request continues with [`AuthContext`] in its extensions.
#[instrument(skip_all, name = "common.middleware.session")]
pub async fn require_session(
    State(resolver): State<Arc<dyn IdentityResolver>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session::session_id_from_headers(req.headers()) else {
        tracing::debug!(target: "common.middleware", "Missing session cookie");
        return unauthorized();
    };

    let Some(user_id) = resolver.resolve_user_id(&session_id).await else {
        tracing::debug!(target: "common.middleware", "Session did not resolve to a user");
        return unauthorized();
    };

    req.extensions_mut().insert(AuthContext {
        session_id,
        user_id,
    });

    next.run(req).await
}

/// Permission gate.
///
/// Reads the [`AuthContext`] installed by [`require_session`] and checks
/// the user's role against the gate's required role. A missing context
/// means the gates were mis-ordered and answers 401; an unresolvable or
/// mismatched role answers 403.
#[instrument(skip_all, name = "common.middleware.role")]
pub async fn require_role(State(gate): State<RoleGate>, req: Request, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<AuthContext>() else {
        tracing::warn!(
            target: "common.middleware",
            "Role gate reached without an auth context"
        );
        return unauthorized();
    };
    let user_id = ctx.user_id;

    match gate.resolver.resolve_role(user_id).await {
        Some(role) if role == gate.required => next.run(req).await,
        resolved => {
            tracing::debug!(
                target: "common.middleware",
                user_id = %user_id,
                required = %gate.required,
                resolved = resolved.map(|r| r.as_str()),
                "Role check failed"
            );
            error_response(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("{} role required", gate.required),
            )
        }
    }
}

/// Mock resolver for unit testing gated routes without live identity
/// infrastructure.
pub mod mock {

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock identity resolver backed by in-memory maps.
    #[derive(Default)]
    pub struct MockIdentityResolver {
        /// Known sessions: session id to user id.
        sessions: HashMap<String, UserId>,
        /// Known users: user id to role.
        roles: HashMap<UserId, Role>,
        /// Number of `resolve_user_id` calls made.
        user_id_calls: AtomicUsize,
        /// Number of `resolve_role` calls made.
        role_calls: AtomicUsize,
    }

    impl MockIdentityResolver {
        /// Create a mock that resolves nothing.
        #[must_use]
        pub fn empty() -> Self {
            Self::default()
        }

        /// Create a mock knowing a single session and its user's role.
        #[must_use]
        pub fn with_session(session_id: &str, user_id: UserId, role: Role) -> Self {
            Self::empty().and_session(session_id, user_id, role)
        }

        /// Add another known session (builder form, for multi-user tests).
        #[must_use]
        pub fn and_session(mut self, session_id: &str, user_id: UserId, role: Role) -> Self {
            self.sessions.insert(session_id.to_string(), user_id);
            self.roles.insert(user_id, role);
            self
        }

        /// Get the number of `resolve_user_id` calls made.
        pub fn user_id_calls(&self) -> usize {
            self.user_id_calls.load(Ordering::SeqCst)
        }

        /// Get the number of `resolve_role` calls made.
        pub fn role_calls(&self) -> usize {
            self.role_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityResolver for MockIdentityResolver {
        async fn resolve_user_id(&self, session_id: &str) -> Option<UserId> {
            self.user_id_calls.fetch_add(1, Ordering::SeqCst);
            self.sessions.get(session_id).copied()
        }

        async fn resolve_role(&self, user_id: UserId) -> Option<Role> {
            self.role_calls.fetch_add(1, Ordering::SeqCst);
            self.roles.get(&user_id).copied()
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_resolves_known_session() {
            let mock = MockIdentityResolver::with_session("tok", UserId(7), Role::Admin);

            assert_eq!(mock.resolve_user_id("tok").await, Some(UserId(7)));
            assert_eq!(mock.resolve_user_id("other").await, None);
            assert_eq!(mock.resolve_role(UserId(7)).await, Some(Role::Admin));
            assert_eq!(mock.user_id_calls(), 2);
            assert_eq!(mock.role_calls(), 1);
        }
    }
}
