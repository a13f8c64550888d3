//! Cryptographic helpers: session id generation and password hashing.

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::instrument;

/// Raw entropy per session id. 24 bytes encode to exactly
/// [`SESSION_ID_LEN`] base64url characters with no padding.
const SESSION_ID_BYTES: usize = 24;

/// Length of an encoded session id.
pub const SESSION_ID_LEN: usize = 32;

/// A valid bcrypt hash that matches no password we ever issue.
///
/// Verified against when a login does not exist, so the missing-user path
/// costs the same as a real hash check and response timing cannot be used
/// to probe which logins are registered.
pub const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Generate an opaque session id from CSPRNG bytes.
#[instrument(skip_all)]
pub fn generate_session_id() -> Result<String, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rng.fill(&mut bytes)
        .map_err(|e| AuthError::Crypto(format!("Session id generation failed: {e:?}")))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a password with bcrypt at the given cost.
///
/// The cost range is validated again here so a direct call cannot produce
/// an insecurely cheap hash.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {cost} (must be {MIN_BCRYPT_COST}-{MAX_BCRYPT_COST})"
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Crypto(format!("Password verification failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_32_urlsafe_chars() {
        let id = generate_session_id().unwrap();

        assert_eq!(id.len(), SESSION_ID_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = generate_session_id().unwrap();
        let b = generate_session_id().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("hunter2", MIN_BCRYPT_COST).unwrap();

        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hash_rejects_out_of_range_cost() {
        let result = hash_password("hunter2", MAX_BCRYPT_COST + 1);
        assert!(matches!(result, Err(AuthError::Crypto(_))));
    }

    #[test]
    fn test_dummy_hash_is_verifiable_but_never_matches() {
        assert!(!verify_password("hunter2", DUMMY_BCRYPT_HASH).unwrap());
        assert!(!verify_password("", DUMMY_BCRYPT_HASH).unwrap());
    }
}
