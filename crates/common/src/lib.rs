//! Common utilities and types shared across Marquee services.

#![warn(clippy::pedantic)]

/// Module for the shared HTTP error envelope
pub mod error;

/// Module for shared identity types
pub mod types;

/// Module for the session cookie codec
pub mod session;

/// Module for the access middleware chain (authentication + permission gates)
pub mod middleware;

/// Module for secret types that prevent accidental logging
pub mod secret;
