use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default listener address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default base URL of the auth service's internal listener.
pub const DEFAULT_AUTH_INTERNAL_URL: &str = "http://localhost:8091";

/// Default number of startup connectivity probe attempts.
pub const DEFAULT_CONNECT_RETRIES: u32 = 5;

/// Catalog service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: SecretString,
    pub bind_address: String,
    pub auth_internal_url: String,
    pub connect_retries: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid numeric value for {0}: {1}")]
    InvalidNumber(String, std::num::ParseIntError),
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

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let auth_internal_url = vars
            .get("AUTH_INTERNAL_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUTH_INTERNAL_URL.to_string());

        let connect_retries = match vars.get("CONNECT_RETRIES") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidNumber("CONNECT_RETRIES".to_string(), e))?,
            None => DEFAULT_CONNECT_RETRIES,
        };

        Ok(Config {
            database_url,
            bind_address,
            auth_internal_url,
            connect_retries,
        })
    }
}
