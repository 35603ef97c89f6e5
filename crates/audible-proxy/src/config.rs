//! Service configuration from environment variables.

use std::env;

/// Default listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base64 key for token encryption. Required.
    pub encryption_key: String,
    /// Shared secret expected in the `X-API-Secret` header. When unset the
    /// service accepts unauthenticated requests.
    pub api_secret: Option<String>,
    /// Listen port.
    pub port: u16,
    /// Verbose logging toggle.
    pub debug: bool,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ENCRYPTION_KEY environment variable must be set")]
    MissingEncryptionKey,

    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let encryption_key = lookup("ENCRYPTION_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEncryptionKey)?;

        let api_secret = lookup("API_SECRET").filter(|v| !v.is_empty());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let debug = lookup("DEBUG")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            encryption_key,
            api_secret,
            port,
            debug,
        })
    }
}
