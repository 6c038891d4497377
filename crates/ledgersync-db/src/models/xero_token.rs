//! Encrypted OAuth2 token storage.
//!
//! Rows hold ciphertext only; encryption and decryption live in
//! `ledgersync-vault`, which owns the key.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::DbResult;

/// One Xero tenant's stored credentials (encrypted at rest).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct XeroTokenRow {
    /// Xero tenant (organisation) id.
    pub tenant_id: String,
    /// Display name of the tenant.
    pub tenant_name: String,
    /// Encrypted access token (`iv:tag:data` hex triplet).
    pub access_token: String,
    /// Encrypted refresh token (`iv:tag:data` hex triplet).
    pub refresh_token: String,
    /// Access token expiry.
    pub expires_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Store for Xero token records.
#[derive(Debug, Clone)]
pub struct XeroTokenStore {
    pool: PgPool,
}

impl XeroTokenStore {
    /// Create a new store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the credentials for a tenant.
    #[instrument(skip(self, access_token, refresh_token))]
    pub async fn upsert(
        &self,
        tenant_id: &str,
        tenant_name: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO xero_tokens (tenant_id, tenant_name, access_token,
                                     refresh_token, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id) DO UPDATE SET
                tenant_name = EXCLUDED.tenant_name,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            ",
        )
        .bind(tenant_id)
        .bind(tenant_name)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a specific tenant's credentials.
    #[instrument(skip(self))]
    pub async fn get(&self, tenant_id: &str) -> DbResult<Option<XeroTokenRow>> {
        let row = sqlx::query_as::<_, XeroTokenRow>(
            r"
            SELECT tenant_id, tenant_name, access_token, refresh_token,
                   expires_at, updated_at
            FROM xero_tokens
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Fetch the most recently updated credentials of any tenant.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> DbResult<Option<XeroTokenRow>> {
        let row = sqlx::query_as::<_, XeroTokenRow>(
            r"
            SELECT tenant_id, tenant_name, access_token, refresh_token,
                   expires_at, updated_at
            FROM xero_tokens
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Remove a tenant's credentials (disconnect).
    #[instrument(skip(self))]
    pub async fn delete(&self, tenant_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM xero_tokens WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
