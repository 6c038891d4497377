//! The token vault: persistence + refresh lifecycle for Xero credentials.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use ledgersync_db::XeroTokenStore;

use crate::crypto::TokenCipher;
use crate::error::{VaultError, VaultResult};
use crate::oauth::{OAuthClient, TokenSet};

/// Access tokens are refreshed when expiry is within this buffer.
const REFRESH_BUFFER_MINUTES: i64 = 5;

/// Decrypted, valid credentials ready for API use.
#[derive(Debug, Clone)]
pub struct ValidTokens {
    /// Plaintext bearer token.
    pub access_token: String,
    /// Xero tenant id the token is scoped to.
    pub tenant_id: String,
    /// Organisation display name.
    pub tenant_name: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

/// Connection info for the admin status endpoint. No token material.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionStatus {
    /// Xero tenant id.
    pub tenant_id: String,
    /// Organisation display name.
    pub tenant_name: String,
    /// When the stored access token expires.
    pub expires_at: DateTime<Utc>,
}

/// Encrypts, persists, and refreshes Xero OAuth credentials.
///
/// Injected into the ledger client constructor; there is no ambient global
/// token cache. Refresh is lazy and synchronous within
/// [`get_valid_tokens`](TokenVault::get_valid_tokens).
#[derive(Debug, Clone)]
pub struct TokenVault {
    store: XeroTokenStore,
    cipher: TokenCipher,
    oauth: OAuthClient,
}

impl TokenVault {
    /// Create a new vault.
    #[must_use]
    pub fn new(store: XeroTokenStore, cipher: TokenCipher, oauth: OAuthClient) -> Self {
        Self {
            store,
            cipher,
            oauth,
        }
    }

    /// Whether the OAuth application credentials are configured at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.oauth.config().is_configured()
    }

    /// Access the OAuth client (authorize URL building, code exchange).
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    /// Encrypt and upsert a token set for a tenant.
    #[instrument(skip(self, tokens))]
    pub async fn store_tokens(
        &self,
        tenant_id: &str,
        tenant_name: &str,
        tokens: &TokenSet,
    ) -> VaultResult<()> {
        let access_enc = self.cipher.encrypt(&tokens.access_token)?;
        let refresh_enc = self.cipher.encrypt(&tokens.refresh_token)?;
        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);

        self.store
            .upsert(tenant_id, tenant_name, &access_enc, &refresh_enc, expires_at)
            .await?;

        info!(tenant_id, "Stored Xero tokens");
        Ok(())
    }

    /// Complete the authorization-code flow: exchange the code, resolve the
    /// tenant, and persist tokens. Returns the connected tenant.
    #[instrument(skip(self, code))]
    pub async fn complete_authorization(&self, code: &str) -> VaultResult<ConnectionStatus> {
        let tokens = self.oauth.exchange_code(code).await?;
        let connections = self.oauth.connections(&tokens.access_token).await?;

        let connection = connections.into_iter().next().ok_or_else(|| {
            VaultError::TokenEndpoint("no Xero organisation authorized".to_string())
        })?;

        let tenant_name = connection
            .tenant_name
            .unwrap_or_else(|| "Unknown organisation".to_string());
        self.store_tokens(&connection.tenant_id, &tenant_name, &tokens)
            .await?;

        Ok(ConnectionStatus {
            tenant_id: connection.tenant_id,
            tenant_name,
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
        })
    }

    /// Retrieve valid (decrypted, unexpired) tokens.
    ///
    /// With no `tenant_id` the most recently updated record is used. When
    /// expiry is within the refresh buffer the tokens are refreshed through
    /// the OAuth provider before returning.
    ///
    /// Returns `Ok(None)` — "not connected" — when no record exists, the
    /// ciphertext cannot be decrypted, or refresh fails. Callers must treat
    /// `None` as a terminal condition for the current operation, not retry.
    #[instrument(skip(self))]
    pub async fn get_valid_tokens(
        &self,
        tenant_id: Option<&str>,
    ) -> VaultResult<Option<ValidTokens>> {
        let row = match tenant_id {
            Some(id) => self.store.get(id).await?,
            None => self.store.latest().await?,
        };
        let Some(row) = row else {
            return Ok(None);
        };

        let (access_token, refresh_token) = match (
            self.cipher.decrypt(&row.access_token),
            self.cipher.decrypt(&row.refresh_token),
        ) {
            (Ok(a), Ok(r)) => (a, r),
            (Err(e), _) | (_, Err(e)) => {
                // A row we cannot read is the same as no row at all.
                warn!(tenant_id = %row.tenant_id, error = %e, "Stored tokens undecryptable");
                return Ok(None);
            }
        };

        let refresh_deadline = Utc::now() + Duration::minutes(REFRESH_BUFFER_MINUTES);
        if row.expires_at > refresh_deadline {
            return Ok(Some(ValidTokens {
                access_token,
                tenant_id: row.tenant_id,
                tenant_name: row.tenant_name,
                expires_at: row.expires_at,
            }));
        }

        // Token expired or about to: refresh before handing it out.
        let refreshed = match self.oauth.refresh(&refresh_token).await {
            Ok(t) => t,
            Err(e) => {
                warn!(tenant_id = %row.tenant_id, error = %e, "Token refresh failed");
                return Ok(None);
            }
        };

        self.store_tokens(&row.tenant_id, &row.tenant_name, &refreshed)
            .await?;

        Ok(Some(ValidTokens {
            access_token: refreshed.access_token,
            tenant_id: row.tenant_id,
            tenant_name: row.tenant_name,
            expires_at: Utc::now() + Duration::seconds(refreshed.expires_in),
        }))
    }

    /// Remove a tenant's credentials (disconnect). With no `tenant_id`,
    /// removes the most recently updated record.
    #[instrument(skip(self))]
    pub async fn delete_tokens(&self, tenant_id: Option<&str>) -> VaultResult<bool> {
        let target = match tenant_id {
            Some(id) => Some(id.to_string()),
            None => self.store.latest().await?.map(|row| row.tenant_id),
        };
        let Some(target) = target else {
            return Ok(false);
        };

        let deleted = self.store.delete(&target).await?;
        if deleted {
            info!(tenant_id = %target, "Deleted Xero tokens");
        }
        Ok(deleted)
    }

    /// Connection info for display; never exposes token material.
    #[instrument(skip(self))]
    pub async fn connection_status(&self) -> VaultResult<Option<ConnectionStatus>> {
        Ok(self.store.latest().await?.map(|row| ConnectionStatus {
            tenant_id: row.tenant_id,
            tenant_name: row.tenant_name,
            expires_at: row.expires_at,
        }))
    }
}
