//! Business logic layer.

pub mod core;
