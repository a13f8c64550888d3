//! Session store: ephemeral session records.
//!
//! Redis keys use the `session:{id}` pattern, holding the owning login
//! with a TTL equal to the session lifetime. Inserts are pure (`SET NX
//! EX`): an existing key is never overwritten. The redis-rs
//! `MultiplexedConnection` is cheap to clone, so every operation works on
//! its own clone without locking.

use crate::errors::AuthError;
use crate::repositories::PROBE_RETRY_DELAY;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{info, warn};

/// Ephemeral session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Pure insert of `session_id -> login`, expiring at `expires_at`.
    /// Returns `false` when the id is already present; nothing is
    /// overwritten in that case.
    async fn put(
        &self,
        session_id: &str,
        login: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    /// Owning login of a live session. Expired ids behave exactly like
    /// absent ones.
    async fn get(&self, session_id: &str) -> Result<Option<String>, AuthError>;

    /// Delete a session. Returns `false` when it did not exist.
    async fn delete(&self, session_id: &str) -> Result<bool, AuthError>;
}

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

/// Redis-backed session store.
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connect and verify connectivity.
    ///
    /// Connection plus `PING` are attempted up to `connect_retries` times
    /// with a fixed delay between attempts; exhausting them is a
    /// construction error.
    pub async fn connect(redis_url: &str, connect_retries: u32) -> Result<Self, AuthError> {
        // Note: never log redis_url, it may embed credentials
        // (e.g. redis://:password@host:port).
        let client = Client::open(redis_url)
            .map_err(|e| AuthError::SessionStore(format!("Failed to open Redis client: {e}")))?;

        let attempts = connect_retries.max(1);
        let mut last_err = String::new();

        for attempt in 1..=attempts {
            match Self::probe(&client).await {
                Ok(connection) => {
                    info!(target: "auth.sessions", attempt, "Redis connectivity verified");
                    return Ok(Self { connection });
                }
                Err(e) => {
                    warn!(target: "auth.sessions", attempt, error = %e, "Redis probe failed");
                    last_err = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(PROBE_RETRY_DELAY).await;
            }
        }

        Err(AuthError::SessionStore(format!(
            "Redis unreachable after {attempts} attempts: {last_err}"
        )))
    }

    async fn probe(client: &Client) -> Result<MultiplexedConnection, String> {
        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| format!("connect: {e}"))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| format!("ping: {e}"))?;

        Ok(connection)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        session_id: &str,
        login: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        // Clone the connection (cheap operation) for this request
        let mut conn = self.connection.clone();

        // EX requires a positive TTL.
        let ttl_secs = (expires_at - Utc::now()).num_seconds().max(1);

        // SET NX answers OK when the key was set, nil when it existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(session_key(session_id))
            .arg(login)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::SessionStore(format!("Failed to store session: {e}")))?;

        Ok(reply.is_some())
    }

    async fn get(&self, session_id: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.connection.clone();

        let login: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e| AuthError::SessionStore(format!("Failed to fetch session: {e}")))?;

        Ok(login)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, AuthError> {
        let mut conn = self.connection.clone();

        let deleted: i64 = conn
            .del(session_key(session_id))
            .await
            .map_err(|e| AuthError::SessionStore(format!("Failed to delete session: {e}")))?;

        Ok(deleted > 0)
    }
}

/// In-memory session store for infrastructure-free tests.
pub mod memory {

    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory `SessionStore` with lazy expiry: entries past their
    /// expiry are treated as absent and dropped when touched.
    #[derive(Default)]
    pub struct MemorySessionStore {
        sessions: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    }

    impl MemorySessionStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn put(
            &self,
            session_id: &str,
            login: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<bool, AuthError> {
            let mut sessions = self.sessions.lock().await;

            match sessions.get(session_id) {
                Some((_, expires)) if *expires > Utc::now() => Ok(false),
                _ => {
                    sessions.insert(session_id.to_string(), (login.to_string(), expires_at));
                    Ok(true)
                }
            }
        }

        async fn get(&self, session_id: &str) -> Result<Option<String>, AuthError> {
            let mut sessions = self.sessions.lock().await;

            match sessions.get(session_id) {
                Some((login, expires)) if *expires > Utc::now() => Ok(Some(login.clone())),
                Some(_) => {
                    sessions.remove(session_id);
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, session_id: &str) -> Result<bool, AuthError> {
            let mut sessions = self.sessions.lock().await;

            match sessions.remove(session_id) {
                Some((_, expires)) if expires > Utc::now() => Ok(true),
                _ => Ok(false),
            }
        }
    }
}
