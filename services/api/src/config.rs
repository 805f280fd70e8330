//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// Issued-token lifetime, in hours.
    pub token_ttl_hours: i64,
    /// Upload endpoint of the external asset host.
    pub media_upload_url: String,
    /// API key for the asset host, if the host requires one.
    pub media_api_key: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Token Settings ---
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        let token_ttl_str =
            std::env::var("TOKEN_TTL_HOURS").unwrap_or_else(|_| "24".to_string());
        let token_ttl_hours = token_ttl_str.parse::<i64>().map_err(|e| {
            ConfigError::InvalidValue("TOKEN_TTL_HOURS".to_string(), e.to_string())
        })?;

        // --- Load Media Host Settings ---
        let media_upload_url = std::env::var("MEDIA_UPLOAD_URL")
            .map_err(|_| ConfigError::MissingVar("MEDIA_UPLOAD_URL".to_string()))?;
        let media_api_key = std::env::var("MEDIA_API_KEY").ok();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            token_ttl_hours,
            media_upload_url,
            media_api_key,
        })
    }
}
