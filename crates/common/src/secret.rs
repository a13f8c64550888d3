//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. `SecretString` implements `Debug`
//! with redaction, so a struct that derives `Debug` while holding one cannot
//! leak it through `{:?}` or tracing fields. Values are zeroized on drop.
//!
//! Use `SecretString` for store connection URLs (they embed credentials),
//! raw passwords in transit, and anything else that must never reach a log
//! line. Reading the inner value requires an explicit `expose_secret()`
//! call, which keeps every access greppable.

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("postgres://user:hunter2@db/marquee");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("redis://cache:6379");
        assert_eq!(secret.expose_secret(), "redis://cache:6379");
    }
}
