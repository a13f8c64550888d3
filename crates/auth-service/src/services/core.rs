//! Authorization core: signup, signin, logout and session resolution.
//!
//! `AuthCore` owns the session store behind a `tokio::sync::RwLock`.
//! Session mutation (`signin`'s insert, `logout`'s delete) takes the write
//! guard; lookups take the read guard. The profile store manages its own
//! concurrency and hangs off an `Arc` outside the lock.

use crate::crypto;
use crate::errors::AuthError;
use crate::repositories::profiles::ProfileStore;
use crate::repositories::sessions::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::middleware::IdentityResolver;
use common::types::{Role, UserId};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

/// Sessions live exactly this long from issuance and are never extended.
const SESSION_TTL_HOURS: i64 = 24;

/// Maximum login length in characters.
pub const MAX_LOGIN_LEN: usize = 64;

/// A freshly issued session.
#[derive(Clone)]
pub struct Session {
    /// Opaque session id, also the cookie value.
    pub session_id: String,
    /// Owning login.
    pub login: String,
    /// Fixed expiry, issuance time plus the session TTL.
    pub expires_at: DateTime<Utc>,
}

// Session ids must never reach log output, so Debug redacts the token.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &"[REDACTED]")
            .field("login", &self.login)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Core identity and session operations, shared by the public HTTP
/// surface and the identity bridge.
pub struct AuthCore {
    profiles: Arc<dyn ProfileStore>,
    sessions: RwLock<Box<dyn SessionStore>>,
    bcrypt_cost: u32,
}

impl AuthCore {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        sessions: Box<dyn SessionStore>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            profiles,
            sessions: RwLock::new(sessions),
            bcrypt_cost,
        }
    }

    /// Logins are 1-64 ASCII alphanumeric characters.
    fn validate_login(login: &str) -> Result<(), AuthError> {
        if login.is_empty() || login.len() > MAX_LOGIN_LEN {
            return Err(AuthError::Validation(format!(
                "login must be 1-{MAX_LOGIN_LEN} characters"
            )));
        }
        if !login.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::Validation(
                "login must contain only ASCII letters and digits".to_string(),
            ));
        }
        Ok(())
    }

    /// Register a new login.
    ///
    /// Validation runs before any store call, so a malformed login never
    /// touches storage. The duplicate check here races with concurrent
    /// signups; the store's unique constraint answers `AlreadyExists` for
    /// the loser either way.
    #[instrument(skip_all, name = "auth.core.signup")]
    pub async fn signup(&self, login: &str, password: &str) -> Result<UserId, AuthError> {
        Self::validate_login(login)?;

        if self.profiles.exists(login).await? {
            return Err(AuthError::AlreadyExists);
        }

        let hash = crypto::hash_password(password, self.bcrypt_cost)?;
        let user_id = self.profiles.create_identity(login, &hash).await?;

        tracing::info!(target: "auth.services.core", user_id = %user_id, "Profile created");
        Ok(user_id)
    }

    /// Authenticate a login and issue a fresh session.
    #[instrument(skip_all, name = "auth.core.signin")]
    pub async fn signin(&self, login: &str, password: &str) -> Result<Session, AuthError> {
        let identity = match self.profiles.authenticate(login, password).await {
            Ok(identity) => identity,
            // Collapse the storage-layer distinction so the wire cannot
            // reveal whether the login exists.
            Err(AuthError::ProfileNotFound | AuthError::InvalidCredential) => {
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let session_id = crypto::generate_session_id()?;
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let inserted = {
            let sessions = self.sessions.write().await;
            sessions.put(&session_id, &identity.login, expires_at).await?
        };

        if !inserted {
            // A colliding id must never silently hand out a session that
            // may belong to someone else.
            tracing::error!(target: "auth.services.core", "Session id collision on insert");
            return Err(AuthError::Internal);
        }

        tracing::info!(target: "auth.services.core", user_id = %identity.user_id, "Session issued");

        Ok(Session {
            session_id,
            login: identity.login,
            expires_at,
        })
    }

    /// Kill a session. `SessionNotFound` when it was not live.
    #[instrument(skip_all, name = "auth.core.logout")]
    pub async fn logout(&self, session_id: &str) -> Result<(), AuthError> {
        let deleted = {
            let sessions = self.sessions.write().await;
            sessions.delete(session_id).await?
        };

        if !deleted {
            return Err(AuthError::SessionNotFound);
        }

        tracing::info!(target: "auth.services.core", "Session deleted");
        Ok(())
    }

    /// Whether a session id refers to a live session.
    pub async fn is_session_active(&self, session_id: &str) -> Result<bool, AuthError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).await?.is_some())
    }

    /// Resolve a session id to the owning user's profile id.
    ///
    /// Two hops: session to login, login to profile id. Any failure on
    /// either hop, including store faults, collapses into
    /// `IdentityNotResolved`; the hop detail goes to the log only.
    #[instrument(skip_all, name = "auth.core.resolve_user_id")]
    pub async fn resolve_user_id(&self, session_id: &str) -> Result<UserId, AuthError> {
        let lookup = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).await
        };

        let login = match lookup {
            Ok(Some(login)) => login,
            Ok(None) => {
                tracing::debug!(target: "auth.services.core", "No live session for id");
                return Err(AuthError::IdentityNotResolved);
            }
            Err(e) => {
                tracing::warn!(target: "auth.services.core", error = %e, "Session hop failed");
                return Err(AuthError::IdentityNotResolved);
            }
        };

        match self.profiles.profile_id(&login).await {
            Ok(user_id) => Ok(user_id),
            Err(e) => {
                tracing::warn!(target: "auth.services.core", error = %e, "Profile hop failed");
                Err(AuthError::IdentityNotResolved)
            }
        }
    }

    /// Role of a login.
    pub async fn resolve_role(&self, login: &str) -> Result<Role, AuthError> {
        self.profiles.role_for_login(login).await
    }

    /// Role of a profile id (the bridge's role lookup).
    pub async fn resolve_role_by_id(&self, user_id: UserId) -> Result<Role, AuthError> {
        self.profiles.role_for_id(user_id).await
    }
}

/// The auth service gates its own protected routes with the in-process
/// core rather than going over the wire.
#[async_trait]
impl IdentityResolver for AuthCore {
    async fn resolve_user_id(&self, session_id: &str) -> Option<UserId> {
        AuthCore::resolve_user_id(self, session_id).await.ok()
    }

    async fn resolve_role(&self, user_id: UserId) -> Option<Role> {
        self.resolve_role_by_id(user_id).await.ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::MIN_BCRYPT_COST;
    use crate::repositories::profiles::memory::MemoryProfileStore;
    use crate::repositories::sessions::memory::MemorySessionStore;

    fn test_core() -> AuthCore {
        AuthCore::new(
            Arc::new(MemoryProfileStore::new()),
            Box::new(MemorySessionStore::new()),
            MIN_BCRYPT_COST,
        )
    }

    fn core_with_profiles(profiles: Arc<MemoryProfileStore>) -> AuthCore {
        AuthCore::new(profiles, Box::new(MemorySessionStore::new()), MIN_BCRYPT_COST)
    }

    /// Session store that reports every insert as a collision.
    struct CollidingSessionStore;

    #[async_trait]
    impl SessionStore for CollidingSessionStore {
        async fn put(
            &self,
            _session_id: &str,
            _login: &str,
            _expires_at: DateTime<Utc>,
        ) -> Result<bool, AuthError> {
            Ok(false)
        }

        async fn get(&self, _session_id: &str) -> Result<Option<String>, AuthError> {
            Ok(None)
        }

        async fn delete(&self, _session_id: &str) -> Result<bool, AuthError> {
            Ok(false)
        }
    }

    /// Session store whose lookups fail.
    struct FaultySessionStore;

    #[async_trait]
    impl SessionStore for FaultySessionStore {
        async fn put(
            &self,
            _session_id: &str,
            _login: &str,
            _expires_at: DateTime<Utc>,
        ) -> Result<bool, AuthError> {
            Err(AuthError::SessionStore("connection reset".to_string()))
        }

        async fn get(&self, _session_id: &str) -> Result<Option<String>, AuthError> {
            Err(AuthError::SessionStore("connection reset".to_string()))
        }

        async fn delete(&self, _session_id: &str) -> Result<bool, AuthError> {
            Err(AuthError::SessionStore("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_signup_signin_resolve_round_trip() {
        let core = test_core();

        let user_id = core.signup("alice", "hunter2").await.unwrap();
        let session = core.signin("alice", "hunter2").await.unwrap();

        assert_eq!(session.session_id.len(), crypto::SESSION_ID_LEN);
        assert_eq!(session.login, "alice");
        assert!(core.is_session_active(&session.session_id).await.unwrap());
        assert_eq!(
            AuthCore::resolve_user_id(&core, &session.session_id)
                .await
                .unwrap(),
            user_id
        );
    }

    #[tokio::test]
    async fn test_signup_validates_before_store() {
        let core = test_core();

        for login in ["", "with space", "emoji🦀", "dash-ed"] {
            let result = core.signup(login, "pw").await;
            assert!(
                matches!(result, Err(AuthError::Validation(_))),
                "login {login:?} should fail validation"
            );
        }

        let long_login = "a".repeat(MAX_LOGIN_LEN + 1);
        let result = core.signup(&long_login, "pw").await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        // 64 chars exactly is fine.
        let max_login = "a".repeat(MAX_LOGIN_LEN);
        assert!(core.signup(&max_login, "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_signup_twice_is_already_exists() {
        let core = test_core();

        core.signup("alice", "hunter2").await.unwrap();
        let result = core.signup("alice", "other").await;

        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_signin_collapses_unknown_and_wrong_password() {
        let core = test_core();
        core.signup("alice", "hunter2").await.unwrap();

        let unknown = core.signin("bob", "hunter2").await;
        let wrong = core.signin("alice", "nope").await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_signin_collision_is_internal_never_a_session() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let core = AuthCore::new(
            profiles.clone(),
            Box::new(CollidingSessionStore),
            MIN_BCRYPT_COST,
        );
        core.signup("alice", "hunter2").await.unwrap();

        let result = core.signin("alice", "hunter2").await;
        assert!(matches!(result, Err(AuthError::Internal)));
    }

    #[tokio::test]
    async fn test_logout_kills_session() {
        let core = test_core();
        core.signup("alice", "hunter2").await.unwrap();
        let session = core.signin("alice", "hunter2").await.unwrap();

        core.logout(&session.session_id).await.unwrap();

        assert!(!core.is_session_active(&session.session_id).await.unwrap());
        let resolve = AuthCore::resolve_user_id(&core, &session.session_id).await;
        assert!(matches!(resolve, Err(AuthError::IdentityNotResolved)));

        let again = core.logout(&session.session_id).await;
        assert!(matches!(again, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_concurrent_signins_for_distinct_logins() {
        let core = Arc::new(test_core());
        core.signup("alice", "a").await.unwrap();
        core.signup("bob", "b").await.unwrap();

        let (first, second) = tokio::join!(core.signin("alice", "a"), core.signin("bob", "b"));

        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert!(core.is_session_active(&first.session_id).await.unwrap());
        assert!(core.is_session_active(&second.session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_collapses_store_faults() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let core = AuthCore::new(profiles, Box::new(FaultySessionStore), MIN_BCRYPT_COST);

        let result = AuthCore::resolve_user_id(&core, "sid").await;
        assert!(matches!(result, Err(AuthError::IdentityNotResolved)));
    }

    #[tokio::test]
    async fn test_role_resolution() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let core = core_with_profiles(profiles.clone());

        let user_id = core.signup("alice", "a").await.unwrap();
        assert_eq!(core.resolve_role("alice").await.unwrap(), Role::Standard);

        profiles.set_role("alice", Role::Admin).await;
        assert_eq!(core.resolve_role_by_id(user_id).await.unwrap(), Role::Admin);

        let unknown = core.resolve_role_by_id(UserId(999)).await;
        assert!(matches!(unknown, Err(AuthError::ProfileNotFound)));
    }

    #[tokio::test]
    async fn test_identity_resolver_impl_collapses_to_option() {
        let core = test_core();
        core.signup("alice", "a").await.unwrap();
        let session = core.signin("alice", "a").await.unwrap();

        let resolver: &dyn IdentityResolver = &core;
        let user_id = resolver.resolve_user_id(&session.session_id).await.unwrap();
        assert_eq!(resolver.resolve_role(user_id).await, Some(Role::Standard));
        assert_eq!(resolver.resolve_user_id("bogus").await, None);
        assert_eq!(resolver.resolve_role(UserId(999)).await, None);
    }

    #[test]
    fn test_session_debug_redacts_id() {
        let session = Session {
            session_id: "secret-session-token".to_string(),
            login: "alice".to_string(),
            expires_at: Utc::now(),
        };
        let debug_str = format!("{session:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("secret-session-token"));
    }
}
