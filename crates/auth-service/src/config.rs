use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default public listener address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Default internal (identity bridge) listener address.
pub const DEFAULT_INTERNAL_BIND_ADDRESS: &str = "0.0.0.0:8091";

/// Default number of startup connectivity probe attempts per store.
pub const DEFAULT_CONNECT_RETRIES: u32 = 5;

/// Minimum permitted bcrypt cost (bcrypt's own floor).
pub const MIN_BCRYPT_COST: u32 = 4;

/// Maximum permitted bcrypt cost before hashing gets unreasonably slow.
pub const MAX_BCRYPT_COST: u32 = 16;

/// Default bcrypt cost for password hashing.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Auth service configuration.
///
/// Store URLs are held as `SecretString` because they embed credentials;
/// the derived `Debug` output redacts them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: SecretString,
    pub redis_url: SecretString,
    pub bind_address: String,
    pub internal_bind_address: String,
    pub connect_retries: u32,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid numeric value for {0}: {1}")]
    InvalidNumber(String, std::num::ParseIntError),

    #[error("Invalid bcrypt cost: {0} (must be {MIN_BCRYPT_COST}-{MAX_BCRYPT_COST})")]
    InvalidBcryptCost(u32),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = SecretString::from(
            vars.get("DATABASE_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
                .clone(),
        );

        let redis_url = SecretString::from(
            vars.get("REDIS_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
                .clone(),
        );

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let internal_bind_address = vars
            .get("INTERNAL_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_INTERNAL_BIND_ADDRESS.to_string());

        let connect_retries = parse_u32(vars, "CONNECT_RETRIES", DEFAULT_CONNECT_RETRIES)?;

        let bcrypt_cost = parse_u32(vars, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        Ok(Config {
            database_url,
            redis_url,
            bind_address,
            internal_bind_address,
            connect_retries,
            bcrypt_cost,
        })
    }
}

fn parse_u32(
    vars: &HashMap<String, String>,
    name: &str,
    default: u32,
) -> Result<u32, ConfigError> {
    match vars.get(name) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidNumber(name.to_string(), e)),
        None => Ok(default),
    }
}
