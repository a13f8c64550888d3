//! Storage layer: durable profiles in Postgres, ephemeral sessions in Redis.

pub mod profiles;
pub mod sessions;

use std::time::Duration;

/// Fixed delay between startup connectivity probe attempts.
pub(crate) const PROBE_RETRY_DELAY: Duration = Duration::from_secs(1);
