//! Xero OAuth2 client: authorization URL, code exchange, token refresh,
//! and tenant connection listing.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{VaultError, VaultResult};

/// Default Xero OAuth token endpoint.
const DEFAULT_TOKEN_URL: &str = "https://identity.xero.com/connect/token";

/// Default Xero authorize endpoint.
const DEFAULT_AUTHORIZE_URL: &str = "https://login.xero.com/identity/connect/authorize";

/// Default Xero connections endpoint (lists authorized tenants).
const DEFAULT_CONNECTIONS_URL: &str = "https://api.xero.com/connections";

/// Scopes required for contact/invoice/payment sync.
const SCOPES: &str = "offline_access accounting.transactions accounting.contacts accounting.settings";

/// OAuth2 application configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client id; empty when the integration is unconfigured.
    pub client_id: String,
    /// OAuth client secret; empty when the integration is unconfigured.
    pub client_secret: String,
    /// Redirect URI registered with Xero.
    pub redirect_uri: String,
    /// Token endpoint (overridable for tests).
    pub token_url: String,
    /// Authorize endpoint.
    pub authorize_url: String,
    /// Connections endpoint (overridable for tests).
    pub connections_url: String,
}

impl OAuthConfig {
    /// Build a config with the production Xero endpoints.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            connections_url: DEFAULT_CONNECTIONS_URL.to_string(),
        }
    }

    /// Whether OAuth credentials are present at all.
    ///
    /// When false, every sync entry point short-circuits as a no-op rather
    /// than failing: an unconfigured integration is not an error.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// A fresh set of tokens from the OAuth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token (single use with Xero; replaced on every refresh).
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

/// One authorized Xero organisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XeroConnection {
    /// Xero tenant id.
    pub tenant_id: String,
    /// Organisation display name.
    #[serde(default)]
    pub tenant_name: Option<String>,
}

/// HTTP client for the Xero OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Access the configuration.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization redirect URL for the connect flow.
    #[must_use]
    pub fn authorize_redirect(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> VaultResult<TokenSet> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
        ])
        .await
    }

    /// Refresh an expired (or expiring) access token.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> VaultResult<TokenSet> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// List the organisations the current tokens are authorized for.
    #[instrument(skip(self, access_token))]
    pub async fn connections(&self, access_token: &str) -> VaultResult<Vec<XeroConnection>> {
        let response = self
            .http
            .get(&self.config.connections_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::TokenEndpoint(format!(
                "connections request failed: HTTP {status}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> VaultResult<TokenSet> {
        if !self.config.is_configured() {
            return Err(VaultError::NotConfigured);
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Token endpoint rejected request");
            return Err(VaultError::TokenEndpoint(format!(
                "HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }

        Ok(response.json().await?)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
