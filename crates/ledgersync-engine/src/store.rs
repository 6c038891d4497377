//! Trait seams over the persistence layer.
//!
//! The orchestrators depend on these traits rather than the concrete sqlx
//! stores so tests can run against in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ledgersync_core::EntityKind;
use ledgersync_db::{DbResult, SyncConfigStore, SyncRecord, SyncRecordStore, SyncSettings};

/// The sync ledger operations the engine needs.
#[async_trait]
pub trait SyncLedger: Send + Sync {
    /// Look up the record for one source entity.
    async fn get(&self, entity: EntityKind, ninja_id: &str) -> DbResult<Option<SyncRecord>>;

    /// Record a successful sync.
    async fn mark_synced(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        xero_id: &str,
    ) -> DbResult<SyncRecord>;

    /// Record a failed attempt, retaining a previously known mirror id when
    /// `xero_id` is `None`.
    async fn mark_failed(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        error: &str,
        xero_id: Option<&str>,
    ) -> DbResult<SyncRecord>;

    /// Record an ineligible entity.
    async fn mark_skipped(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        note: &str,
    ) -> DbResult<SyncRecord>;

    /// Failed records below the retry ceiling, oldest first, capped at 50.
    async fn failed_records(
        &self,
        entity: EntityKind,
        max_retries: i32,
    ) -> DbResult<Vec<SyncRecord>>;

    /// Source ids already mirrored for one entity kind.
    async fn synced_source_ids(&self, entity: EntityKind) -> DbResult<Vec<String>>;

    /// All synced records for one entity kind.
    async fn synced_records(&self, entity: EntityKind) -> DbResult<Vec<SyncRecord>>;

    /// Remove every record (reset only).
    async fn clear(&self) -> DbResult<u64>;
}

#[async_trait]
impl SyncLedger for SyncRecordStore {
    async fn get(&self, entity: EntityKind, ninja_id: &str) -> DbResult<Option<SyncRecord>> {
        SyncRecordStore::get(self, entity, ninja_id).await
    }

    async fn mark_synced(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        xero_id: &str,
    ) -> DbResult<SyncRecord> {
        SyncRecordStore::mark_synced(self, entity, ninja_id, xero_id).await
    }

    async fn mark_failed(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        error: &str,
        xero_id: Option<&str>,
    ) -> DbResult<SyncRecord> {
        SyncRecordStore::mark_failed(self, entity, ninja_id, error, xero_id).await
    }

    async fn mark_skipped(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        note: &str,
    ) -> DbResult<SyncRecord> {
        SyncRecordStore::mark_skipped(self, entity, ninja_id, note).await
    }

    async fn failed_records(
        &self,
        entity: EntityKind,
        max_retries: i32,
    ) -> DbResult<Vec<SyncRecord>> {
        SyncRecordStore::failed_records(self, entity, max_retries).await
    }

    async fn synced_source_ids(&self, entity: EntityKind) -> DbResult<Vec<String>> {
        SyncRecordStore::synced_source_ids(self, entity).await
    }

    async fn synced_records(&self, entity: EntityKind) -> DbResult<Vec<SyncRecord>> {
        SyncRecordStore::synced_records(self, entity).await
    }

    async fn clear(&self) -> DbResult<u64> {
        SyncRecordStore::clear(self).await
    }
}

/// Read access to the sync settings the orchestrators consume.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Mapper settings with defaults applied.
    async fn settings(&self) -> DbResult<SyncSettings>;

    /// Whether webhook events should trigger sync.
    async fn auto_sync_enabled(&self) -> DbResult<bool>;

    /// Record the time of the last reconciliation run.
    async fn touch_last_reconciliation(&self, at: DateTime<Utc>) -> DbResult<()>;
}

#[async_trait]
impl SettingsSource for SyncConfigStore {
    async fn settings(&self) -> DbResult<SyncSettings> {
        SyncConfigStore::settings(self).await
    }

    async fn auto_sync_enabled(&self) -> DbResult<bool> {
        SyncConfigStore::auto_sync_enabled(self).await
    }

    async fn touch_last_reconciliation(&self, at: DateTime<Utc>) -> DbResult<()> {
        SyncConfigStore::touch_last_reconciliation(self, at).await
    }
}
