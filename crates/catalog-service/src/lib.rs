//! Catalog service library.
//!
//! Owns the films/actors catalog. Holds no identity state of its own:
//! every gated request delegates "who is this session" and "what role is
//! this user" to the auth service over the identity bridge.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `repositories` - Database access layer
//! - `routes` - Router construction
//! - `services` - Identity bridge client
//! - `validation` - Request field validation

#![warn(clippy::pedantic)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;
