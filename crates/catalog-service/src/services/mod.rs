//! Service clients.

pub mod identity_client;
