//! Error types for the token vault.

use thiserror::Error;

/// Errors that can occur in vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The encryption key is missing or malformed.
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (corrupted ciphertext or wrong key).
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] ledgersync_db::DbError),

    /// The OAuth token endpoint rejected the request.
    #[error("Token endpoint error: {0}")]
    TokenEndpoint(String),

    /// HTTP transport error talking to the OAuth provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The integration is not configured (no client id/secret).
    #[error("Xero OAuth is not configured")]
    NotConfigured,
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
