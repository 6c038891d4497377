//! Key/value sync configuration.
//!
//! Values are read per call (no in-process cache) and fall back to the
//! documented defaults when a key is absent.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::DbResult;

/// Configuration keys.
pub mod keys {
    /// Xero revenue account code applied to invoice line items.
    pub const SALES_ACCOUNT_CODE: &str = "sales_account_code";
    /// Tax treatment applied to invoice line items.
    pub const TAX_TYPE: &str = "tax_type";
    /// Xero bank account code payments are applied to.
    pub const PAYMENT_ACCOUNT_CODE: &str = "payment_account_code";
    /// Whether webhook events trigger sync automatically.
    pub const AUTO_SYNC_ENABLED: &str = "auto_sync_enabled";
    /// RFC 3339 timestamp of the last reconciliation run.
    pub const LAST_RECONCILIATION_AT: &str = "last_reconciliation_at";
}

/// Default values used when a key has never been written.
mod defaults {
    pub const SALES_ACCOUNT_CODE: &str = "200";
    pub const TAX_TYPE: &str = "NONE";
    pub const PAYMENT_ACCOUNT_CODE: &str = "090";
}

/// Resolved sync settings used by the entity mappers.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Revenue account code for invoice line items.
    pub sales_account_code: String,
    /// Tax type for invoice line items.
    pub tax_type: String,
    /// Bank account code payments are applied to.
    pub payment_account_code: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sales_account_code: defaults::SALES_ACCOUNT_CODE.to_string(),
            tax_type: defaults::TAX_TYPE.to_string(),
            payment_account_code: defaults::PAYMENT_ACCOUNT_CODE.to_string(),
        }
    }
}

/// Store for the key/value sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfigStore {
    pool: PgPool,
}

impl SyncConfigStore {
    /// Create a new store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read a raw value.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM xero_sync_config WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Write a value.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO xero_sync_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve the mapper settings, applying defaults for absent keys.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> DbResult<SyncSettings> {
        let base = SyncSettings::default();
        Ok(SyncSettings {
            sales_account_code: self
                .get(keys::SALES_ACCOUNT_CODE)
                .await?
                .unwrap_or(base.sales_account_code),
            tax_type: self.get(keys::TAX_TYPE).await?.unwrap_or(base.tax_type),
            payment_account_code: self
                .get(keys::PAYMENT_ACCOUNT_CODE)
                .await?
                .unwrap_or(base.payment_account_code),
        })
    }

    /// Whether webhook events should trigger sync. Defaults to true.
    #[instrument(skip(self))]
    pub async fn auto_sync_enabled(&self) -> DbResult<bool> {
        Ok(self
            .get(keys::AUTO_SYNC_ENABLED)
            .await?
            .map_or(true, |v| v != "false"))
    }

    /// Record the time of the last reconciliation run.
    #[instrument(skip(self))]
    pub async fn touch_last_reconciliation(&self, at: DateTime<Utc>) -> DbResult<()> {
        self.set(keys::LAST_RECONCILIATION_AT, &at.to_rfc3339()).await
    }
}
