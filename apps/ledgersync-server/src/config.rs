//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid, or the service
//! exits at startup with a clear error message.

use std::env;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is present but invalid.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Listen port.
    pub port: u16,
    /// Log filter directive.
    pub rust_log: String,
    /// Hex-encoded 32-byte AES key for token encryption.
    pub token_encryption_key: String,
    /// Signing key for the admin session cookie.
    pub session_secret: String,
    /// Xero OAuth client id. Empty means the integration is unconfigured.
    pub xero_client_id: String,
    /// Xero OAuth client secret.
    pub xero_client_secret: String,
    /// Redirect URI registered with Xero.
    pub xero_redirect_uri: String,
    /// Invoice Ninja API base URL.
    pub ninja_api_url: String,
    /// Invoice Ninja API token.
    pub ninja_api_token: String,
    /// Shared secret expected on webhook deliveries.
    pub ninja_webhook_secret: Option<String>,
    /// Bearer secret expected on the cron endpoint.
    pub cron_secret: Option<String>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })?,
            None => 8080,
        };

        let token_encryption_key = required("TOKEN_ENCRYPTION_KEY")?;
        if token_encryption_key.len() != 64
            || !token_encryption_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ConfigError::Invalid {
                name: "TOKEN_ENCRYPTION_KEY",
                reason: "expected 64 hex characters (32 bytes)".to_string(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            token_encryption_key,
            session_secret: required("SESSION_SECRET")?,
            xero_client_id: optional("XERO_CLIENT_ID").unwrap_or_default(),
            xero_client_secret: optional("XERO_CLIENT_SECRET").unwrap_or_default(),
            xero_redirect_uri: optional("XERO_REDIRECT_URI").unwrap_or_default(),
            ninja_api_url: optional("NINJA_API_URL")
                .unwrap_or_else(|| "https://invoicing.co/api/v1".to_string()),
            ninja_api_token: required("NINJA_API_TOKEN")?,
            ninja_webhook_secret: optional("NINJA_WEBHOOK_SECRET"),
            cron_secret: optional("CRON_SECRET"),
        })
    }
}
