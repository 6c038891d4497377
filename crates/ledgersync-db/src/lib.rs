//! # LedgerSync DB
//!
//! Postgres persistence for the sync engine:
//!
//! - **Sync ledger** (`xero_sync_records`): one row per (entity kind,
//!   source id), the single source of truth for idempotency.
//! - **Token records** (`xero_tokens`): encrypted OAuth2 credentials per
//!   Xero tenant. Ciphertext only; encryption lives in `ledgersync-vault`.
//! - **Sync config** (`xero_sync_config`): key/value settings read lazily
//!   with documented defaults.
//!
//! Migrations are embedded from `migrations/` and run via [`run_migrations`].

pub mod error;
pub mod migrations;
pub mod models;

pub use error::DbError;
pub use migrations::run_migrations;
pub use models::sync_config::{SyncConfigStore, SyncSettings};
pub use models::sync_record::{StatusCount, SyncRecord, SyncRecordStore};
pub use models::xero_token::{XeroTokenRow, XeroTokenStore};

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
