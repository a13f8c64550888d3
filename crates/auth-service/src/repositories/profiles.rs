//! Profile store: identities, credentials and roles.
//!
//! Schema: `profile(id, login, id_password, id_role)` with the bcrypt hash
//! in `password(id, value)` and the role in `role(id, value)` (seeded with
//! `standard` and `admin`). Profile creation writes the credential row and
//! the profile row in one transaction.

use crate::crypto;
use crate::errors::AuthError;
use crate::repositories::PROBE_RETRY_DELAY;
use async_trait::async_trait;
use common::types::{Role, UserId};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub login: String,
    pub role: Role,
}

/// Durable identity storage.
///
/// `authenticate` is the only operation that may distinguish a missing
/// login (`ProfileNotFound`) from a wrong password (`InvalidCredential`);
/// callers collapse both before anything reaches the wire. The missing-
/// login path verifies against a dummy hash so the two answers cost the
/// same amount of time.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create a login with the given credential hash and the default
    /// `standard` role. `AlreadyExists` on a duplicate login.
    async fn create_identity(
        &self,
        login: &str,
        credential_hash: &str,
    ) -> Result<UserId, AuthError>;

    /// Whether a login is registered.
    async fn exists(&self, login: &str) -> Result<bool, AuthError>;

    /// Check a raw password against the stored credential.
    async fn authenticate(&self, login: &str, raw_password: &str) -> Result<Identity, AuthError>;

    /// Profile id for a login; `ProfileNotFound` when absent.
    async fn profile_id(&self, login: &str) -> Result<UserId, AuthError>;

    /// Role for a login; `ProfileNotFound` when absent.
    async fn role_for_login(&self, login: &str) -> Result<Role, AuthError>;

    /// Role for a profile id; `ProfileNotFound` when absent.
    async fn role_for_id(&self, user_id: UserId) -> Result<Role, AuthError>;
}

/// Postgres-backed profile store.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Connect and verify connectivity.
    ///
    /// The pool itself is created lazily; connectivity is then probed with
    /// `SELECT 1` up to `connect_retries` times with a fixed delay between
    /// attempts. Exhausting the attempts is a construction error, so a
    /// half-initialized handle can never escape.
    pub async fn connect(database_url: &str, connect_retries: u32) -> Result<Self, AuthError> {
        // Note: never log database_url, it may embed credentials.
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| AuthError::Database(format!("Invalid Postgres URL: {e}")))?;

        Self::ping(&pool, connect_retries).await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by migration-driven test setups).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ping(pool: &PgPool, connect_retries: u32) -> Result<(), AuthError> {
        let attempts = connect_retries.max(1);
        let mut last_err = String::new();

        for attempt in 1..=attempts {
            match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => {
                    info!(target: "auth.profiles", attempt, "Postgres connectivity verified");
                    return Ok(());
                }
                Err(e) => {
                    warn!(target: "auth.profiles", attempt, error = %e, "Postgres probe failed");
                    last_err = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(PROBE_RETRY_DELAY).await;
            }
        }

        Err(AuthError::Database(format!(
            "Postgres unreachable after {attempts} attempts: {last_err}"
        )))
    }
}

/// Maps a profile-insert failure: a unique violation is a duplicate login
/// (the only unique column), anything else is a store fault.
fn create_profile_error(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::AlreadyExists,
        _ => AuthError::Database(format!("Failed to create profile: {e}")),
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn create_identity(
        &self,
        login: &str,
        credential_hash: &str,
    ) -> Result<UserId, AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::Database(format!("Failed to begin transaction: {e}")))?;

        let (password_id,): (i64,) =
            sqlx::query_as("INSERT INTO password (value) VALUES ($1) RETURNING id")
                .bind(credential_hash)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AuthError::Database(format!("Failed to store credential: {e}")))?;

        let (profile_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO profile (login, id_password, id_role)
            VALUES ($1, $2, (SELECT id FROM role WHERE value = $3))
            RETURNING id
            "#,
        )
        .bind(login)
        .bind(password_id)
        .bind(Role::Standard.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(create_profile_error)?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Database(format!("Failed to commit profile creation: {e}")))?;

        Ok(UserId(profile_id))
    }

    async fn exists(&self, login: &str) -> Result<bool, AuthError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM profile WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Database(format!("Failed to check login: {e}")))?;

        Ok(row.is_some())
    }

    async fn authenticate(&self, login: &str, raw_password: &str) -> Result<Identity, AuthError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT p.id, pw.value, r.value
            FROM profile p
            JOIN password pw ON pw.id = p.id_password
            JOIN role r ON r.id = p.id_role
            WHERE p.login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch credential: {e}")))?;

        let Some((id, stored_hash, role)) = row else {
            // Burn a hash verification so a missing login costs the same
            // as a wrong password.
            crypto::verify_password(raw_password, crypto::DUMMY_BCRYPT_HASH)?;
            return Err(AuthError::ProfileNotFound);
        };

        if !crypto::verify_password(raw_password, &stored_hash)? {
            return Err(AuthError::InvalidCredential);
        }

        let role = Role::from_str(&role)
            .map_err(|e| AuthError::Database(format!("Corrupt role value: {e}")))?;

        Ok(Identity {
            user_id: UserId(id),
            login: login.to_string(),
            role,
        })
    }

    async fn profile_id(&self, login: &str) -> Result<UserId, AuthError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM profile WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Database(format!("Failed to fetch profile id: {e}")))?;

        row.map(|(id,)| UserId(id))
            .ok_or(AuthError::ProfileNotFound)
    }

    async fn role_for_login(&self, login: &str) -> Result<Role, AuthError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT r.value FROM profile p JOIN role r ON r.id = p.id_role WHERE p.login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch role: {e}")))?;

        let (role,) = row.ok_or(AuthError::ProfileNotFound)?;
        Role::from_str(&role).map_err(|e| AuthError::Database(format!("Corrupt role value: {e}")))
    }

    async fn role_for_id(&self, user_id: UserId) -> Result<Role, AuthError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT r.value FROM profile p JOIN role r ON r.id = p.id_role WHERE p.id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch role: {e}")))?;

        let (role,) = row.ok_or(AuthError::ProfileNotFound)?;
        Role::from_str(&role).map_err(|e| AuthError::Database(format!("Corrupt role value: {e}")))
    }
}

/// In-memory profile store for infrastructure-free tests.
pub mod memory {

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tokio::sync::Mutex;

    struct ProfileRecord {
        user_id: UserId,
        credential_hash: String,
        role: Role,
    }

    /// In-memory `ProfileStore`, keyed by login.
    #[derive(Default)]
    pub struct MemoryProfileStore {
        profiles: Mutex<HashMap<String, ProfileRecord>>,
        next_id: AtomicI64,
    }

    impl MemoryProfileStore {
        #[must_use]
        pub fn new() -> Self {
            Self {
                profiles: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }
        }

        /// Change a login's role. Returns `false` for an unknown login.
        ///
        /// Test scaffolding: the public surface only ever creates
        /// `standard` profiles, but role-gated routes need admins.
        pub async fn set_role(&self, login: &str, role: Role) -> bool {
            let mut profiles = self.profiles.lock().await;
            match profiles.get_mut(login) {
                Some(record) => {
                    record.role = role;
                    true
                }
                None => false,
            }
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfileStore {
        async fn create_identity(
            &self,
            login: &str,
            credential_hash: &str,
        ) -> Result<UserId, AuthError> {
            let mut profiles = self.profiles.lock().await;
            if profiles.contains_key(login) {
                return Err(AuthError::AlreadyExists);
            }

            let user_id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst));
            profiles.insert(
                login.to_string(),
                ProfileRecord {
                    user_id,
                    credential_hash: credential_hash.to_string(),
                    role: Role::Standard,
                },
            );

            Ok(user_id)
        }

        async fn exists(&self, login: &str) -> Result<bool, AuthError> {
            Ok(self.profiles.lock().await.contains_key(login))
        }

        async fn authenticate(
            &self,
            login: &str,
            raw_password: &str,
        ) -> Result<Identity, AuthError> {
            let profiles = self.profiles.lock().await;

            let Some(record) = profiles.get(login) else {
                crypto::verify_password(raw_password, crypto::DUMMY_BCRYPT_HASH)?;
                return Err(AuthError::ProfileNotFound);
            };

            if !crypto::verify_password(raw_password, &record.credential_hash)? {
                return Err(AuthError::InvalidCredential);
            }

            Ok(Identity {
                user_id: record.user_id,
                login: login.to_string(),
                role: record.role,
            })
        }

        async fn profile_id(&self, login: &str) -> Result<UserId, AuthError> {
            self.profiles
                .lock()
                .await
                .get(login)
                .map(|record| record.user_id)
                .ok_or(AuthError::ProfileNotFound)
        }

        async fn role_for_login(&self, login: &str) -> Result<Role, AuthError> {
            self.profiles
                .lock()
                .await
                .get(login)
                .map(|record| record.role)
                .ok_or(AuthError::ProfileNotFound)
        }

        async fn role_for_id(&self, user_id: UserId) -> Result<Role, AuthError> {
            self.profiles
                .lock()
                .await
                .values()
                .find(|record| record.user_id == user_id)
                .map(|record| record.role)
                .ok_or(AuthError::ProfileNotFound)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::memory::MemoryProfileStore;
    use super::*;
    use crate::config::MIN_BCRYPT_COST;

    fn hash(password: &str) -> String {
        crypto::hash_password(password, MIN_BCRYPT_COST).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let store = MemoryProfileStore::new();
        let user_id = store.create_identity("alice", &hash("hunter2")).await.unwrap();

        assert!(store.exists("alice").await.unwrap());

        let identity = store.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::Standard);
    }

    #[tokio::test]
    async fn test_duplicate_login_is_already_exists() {
        let store = MemoryProfileStore::new();
        store.create_identity("alice", &hash("a")).await.unwrap();

        let result = store.create_identity("alice", &hash("b")).await;
        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_authenticate_distinguishes_missing_from_wrong() {
        let store = MemoryProfileStore::new();
        store.create_identity("alice", &hash("hunter2")).await.unwrap();

        let missing = store.authenticate("bob", "hunter2").await;
        assert!(matches!(missing, Err(AuthError::ProfileNotFound)));

        let wrong = store.authenticate("alice", "nope").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_role_lookups() {
        let store = MemoryProfileStore::new();
        let user_id = store.create_identity("alice", &hash("a")).await.unwrap();

        assert_eq!(store.role_for_login("alice").await.unwrap(), Role::Standard);
        assert_eq!(store.role_for_id(user_id).await.unwrap(), Role::Standard);

        assert!(store.set_role("alice", Role::Admin).await);
        assert_eq!(store.role_for_id(user_id).await.unwrap(), Role::Admin);

        let unknown = store.role_for_id(UserId(999)).await;
        assert!(matches!(unknown, Err(AuthError::ProfileNotFound)));
    }

    #[tokio::test]
    async fn test_profile_id_for_unknown_login() {
        let store = MemoryProfileStore::new();
        let result = store.profile_id("ghost").await;
        assert!(matches!(result, Err(AuthError::ProfileNotFound)));
    }

    #[derive(Debug)]
    struct StubDbError {
        unique: bool,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"profile_login_key\"")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_create_profile_error_maps_by_violation_kind() {
        let dup = super::create_profile_error(sqlx::Error::Database(Box::new(StubDbError {
            unique: true,
        })));
        assert!(matches!(dup, AuthError::AlreadyExists));

        let other = super::create_profile_error(sqlx::Error::Database(Box::new(StubDbError {
            unique: false,
        })));
        assert!(matches!(other, AuthError::Database(_)));

        let pool = super::create_profile_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(pool, AuthError::Database(_)));
    }
}
