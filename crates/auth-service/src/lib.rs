//! Auth service library.
//!
//! Owns identities, credentials and sessions for the Marquee platform.
//! Serves the public authentication endpoints (`/signup`, `/signin`,
//! `/logout`) and the internal identity bridge that the catalog service
//! calls to resolve sessions and roles.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Session id generation and password hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers (public + internal)
//! - `repositories` - Storage layer (Postgres profiles, Redis sessions)
//! - `routes` - Router construction for both listeners
//! - `services` - Business logic layer

#![warn(clippy::pedantic)]

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod repositories;
pub mod routes;
pub mod services;
