//! # LedgerSync Vault
//!
//! Encrypted storage and lifecycle management for Xero OAuth2 credentials:
//!
//! - AES-256-GCM encryption of access/refresh tokens at rest, serialized as
//!   an `iv:tag:data` hex triplet with a random 16-byte IV per call.
//! - Transparent refresh: [`TokenVault::get_valid_tokens`] refreshes through
//!   the OAuth token endpoint when expiry is within a 5-minute buffer.
//! - "Not connected" signalling: refresh failure and undecryptable rows both
//!   surface as `Ok(None)`, never as errors, so callers degrade gracefully.

pub mod crypto;
pub mod error;
pub mod oauth;
pub mod vault;

pub use crypto::TokenCipher;
pub use error::{VaultError, VaultResult};
pub use oauth::{OAuthClient, OAuthConfig, TokenSet, XeroConnection};
pub use vault::{ConnectionStatus, TokenVault, ValidTokens};
