//! HTTP client for the auth service's identity bridge.
//!
//! The catalog service holds no identity state; this client is its only
//! way to answer "who is this session" and "what role is this user". Every
//! failure - transport, timeout, non-2xx, undecodable body, unknown role
//! string - collapses into `None`, which the gates treat as not
//! authorized. Nothing is cached: each gated request pays one round trip
//! per resolution step.

use async_trait::async_trait;
use common::middleware::IdentityResolver;
use common::types::{Role, UserId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

/// Default timeout for bridge requests in seconds.
const BRIDGE_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct UserIdRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserIdResponse {
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct RoleRequest {
    user_id: i64,
}

#[derive(Debug, Deserialize)]
struct RoleResponse {
    role: String,
}

/// Identity bridge client.
#[derive(Clone)]
pub struct IdentityClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL of the auth service's internal listener.
    base_url: String,
}

/// Error building the underlying HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("Failed to build identity bridge client: {0}")]
pub struct IdentityClientError(String);

impl IdentityClient {
    /// Create a new bridge client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the auth service's internal listener
    ///   (e.g. "http://localhost:8091")
    pub fn new(base_url: String) -> Result<Self, IdentityClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(BRIDGE_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                error!(target: "catalog.services.identity", error = %e, "Failed to build HTTP client");
                IdentityClientError(e.to_string())
            })?;

        Ok(Self { client, base_url })
    }

    /// POSTs a bridge request and decodes the 2xx body; any other outcome
    /// is `None`.
    async fn resolve<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Option<Resp> {
        let url = format!("{}{path}", self.base_url);

        let response = match self.client.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "catalog.services.identity", error = %e, "Bridge request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            // 404 is the bridge's normal "did not resolve"; anything else
            // is worth a louder log but the caller's answer is the same.
            if status.as_u16() == 404 {
                tracing::debug!(target: "catalog.services.identity", "Bridge resolution missed");
            } else {
                warn!(target: "catalog.services.identity", status = %status, "Unexpected bridge response");
            }
            return None;
        }

        match response.json::<Resp>().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(target: "catalog.services.identity", error = %e, "Failed to parse bridge response");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityResolver for IdentityClient {
    async fn resolve_user_id(&self, session_id: &str) -> Option<UserId> {
        let response: UserIdResponse = self
            .resolve("/internal/v1/identity/user-id", &UserIdRequest { session_id })
            .await?;

        Some(UserId(response.user_id))
    }

    async fn resolve_role(&self, user_id: UserId) -> Option<Role> {
        let response: RoleResponse = self
            .resolve("/internal/v1/identity/role", &RoleRequest { user_id: user_id.0 })
            .await?;

        match response.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                // An unknown role string must deny, never grant.
                error!(target: "catalog.services.identity", error = %e, "Bridge returned unknown role");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_request_wire_shape() {
        let json = serde_json::to_string(&UserIdRequest { session_id: "tok" }).unwrap();
        assert_eq!(json, r#"{"session_id":"tok"}"#);
    }

    #[test]
    fn test_user_id_response_wire_shape() {
        let response: UserIdResponse = serde_json::from_str(r#"{"user_id":7}"#).unwrap();
        assert_eq!(response.user_id, 7);
    }

    #[test]
    fn test_role_wire_shapes() {
        let json = serde_json::to_string(&RoleRequest { user_id: 7 }).unwrap();
        assert_eq!(json, r#"{"user_id":7}"#);

        let response: RoleResponse = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(response.role, "admin");
    }

    #[tokio::test]
    async fn test_unreachable_bridge_resolves_to_none() {
        // Nothing listens on this port; both lookups must collapse to None
        // rather than erroring through to the caller.
        let client = IdentityClient::new("http://127.0.0.1:1".to_string()).unwrap();

        assert_eq!(client.resolve_user_id("tok").await, None);
        assert_eq!(client.resolve_role(UserId(7)).await, None);
    }
}
