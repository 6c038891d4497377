//! Sync ledger access.
//!
//! One row per (entity_type, ninja_id). Every write is an upsert keyed on
//! that natural key, so repeated attempts for the same source entity always
//! converge on a single row regardless of which trigger fired them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use ledgersync_core::{EntityKind, RecordStatus};

use crate::error::DbError;
use crate::DbResult;

/// Maximum number of failed records returned per reconciliation batch.
pub const MAX_RECONCILE_BATCH: i64 = 50;

/// One entry in the sync ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Row id.
    pub id: Uuid,
    /// Kind of source entity.
    pub entity_type: EntityKind,
    /// Identifier in the source system (stable, never reused).
    pub ninja_id: String,
    /// Identifier in the external ledger once created.
    pub xero_id: Option<String>,
    /// Current status.
    pub status: RecordStatus,
    /// Last failure reason.
    pub error_message: Option<String>,
    /// Failed attempts since the last success.
    pub retry_count: i32,
    /// Timestamp of the last successful sync.
    pub synced_at: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate count of records per (entity kind, status).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    /// Kind of source entity.
    pub entity_type: EntityKind,
    /// Record status.
    pub status: RecordStatus,
    /// Number of rows.
    pub count: i64,
}

/// Store for the sync ledger.
#[derive(Debug, Clone)]
pub struct SyncRecordStore {
    pool: PgPool,
}

const RECORD_COLUMNS: &str = "id, entity_type, ninja_id, xero_id, status, error_message, \
                              retry_count, synced_at, created_at, updated_at";

impl SyncRecordStore {
    /// Create a new store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up the record for one source entity.
    #[instrument(skip(self))]
    pub async fn get(&self, entity: EntityKind, ninja_id: &str) -> DbResult<Option<SyncRecord>> {
        let row = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM xero_sync_records
            WHERE entity_type = $1 AND ninja_id = $2
            ",
        ))
        .bind(entity.as_str())
        .bind(ninja_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SyncRecordRow::into_record).transpose()
    }

    /// Record a successful sync: status `synced`, retry count back to zero.
    #[instrument(skip(self))]
    pub async fn mark_synced(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        xero_id: &str,
    ) -> DbResult<SyncRecord> {
        let row = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            INSERT INTO xero_sync_records (entity_type, ninja_id, xero_id, status, synced_at)
            VALUES ($1, $2, $3, 'synced', NOW())
            ON CONFLICT (entity_type, ninja_id) DO UPDATE SET
                xero_id = EXCLUDED.xero_id,
                status = 'synced',
                error_message = NULL,
                retry_count = 0,
                synced_at = NOW(),
                updated_at = NOW()
            RETURNING {RECORD_COLUMNS}
            ",
        ))
        .bind(entity.as_str())
        .bind(ninja_id)
        .bind(xero_id)
        .fetch_one(&self.pool)
        .await?;

        row.into_record()
    }

    /// Record a failed attempt: status `failed`, retry count incremented.
    ///
    /// When `xero_id` is `None` any previously known mirror id is retained
    /// (found-but-update-failed keeps the pointer for the next attempt).
    #[instrument(skip(self, error))]
    pub async fn mark_failed(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        error: &str,
        xero_id: Option<&str>,
    ) -> DbResult<SyncRecord> {
        let row = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            INSERT INTO xero_sync_records (entity_type, ninja_id, xero_id, status,
                                           error_message, retry_count)
            VALUES ($1, $2, $3, 'failed', $4, 1)
            ON CONFLICT (entity_type, ninja_id) DO UPDATE SET
                xero_id = COALESCE(EXCLUDED.xero_id, xero_sync_records.xero_id),
                status = 'failed',
                error_message = EXCLUDED.error_message,
                retry_count = xero_sync_records.retry_count + 1,
                updated_at = NOW()
            RETURNING {RECORD_COLUMNS}
            ",
        ))
        .bind(entity.as_str())
        .bind(ninja_id)
        .bind(xero_id)
        .bind(error)
        .fetch_one(&self.pool)
        .await?;

        row.into_record()
    }

    /// Record an ineligible entity: status `skipped`, terminal.
    #[instrument(skip(self))]
    pub async fn mark_skipped(
        &self,
        entity: EntityKind,
        ninja_id: &str,
        note: &str,
    ) -> DbResult<SyncRecord> {
        let row = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            INSERT INTO xero_sync_records (entity_type, ninja_id, status, error_message)
            VALUES ($1, $2, 'skipped', $3)
            ON CONFLICT (entity_type, ninja_id) DO UPDATE SET
                status = 'skipped',
                error_message = EXCLUDED.error_message,
                updated_at = NOW()
            RETURNING {RECORD_COLUMNS}
            ",
        ))
        .bind(entity.as_str())
        .bind(ninja_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        row.into_record()
    }

    /// Failed records eligible for another attempt, oldest first.
    ///
    /// Returns at most [`MAX_RECONCILE_BATCH`] rows with
    /// `retry_count < max_retries`, bounding retry storms and batch size.
    #[instrument(skip(self))]
    pub async fn failed_records(
        &self,
        entity: EntityKind,
        max_retries: i32,
    ) -> DbResult<Vec<SyncRecord>> {
        let rows = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM xero_sync_records
            WHERE entity_type = $1 AND status = 'failed' AND retry_count < $2
            ORDER BY updated_at ASC
            LIMIT $3
            ",
        ))
        .bind(entity.as_str())
        .bind(max_retries)
        .bind(MAX_RECONCILE_BATCH)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SyncRecordRow::into_record).collect()
    }

    /// Source ids already mirrored for one entity kind (bulk-sync skip set).
    #[instrument(skip(self))]
    pub async fn synced_source_ids(&self, entity: EntityKind) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r"
            SELECT ninja_id FROM xero_sync_records
            WHERE entity_type = $1 AND status = 'synced'
            ",
        )
        .bind(entity.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// All synced records for one entity kind (used by reset to void mirrors).
    #[instrument(skip(self))]
    pub async fn synced_records(&self, entity: EntityKind) -> DbResult<Vec<SyncRecord>> {
        let rows = sqlx::query_as::<_, SyncRecordRow>(&format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM xero_sync_records
            WHERE entity_type = $1 AND status = 'synced'
            ORDER BY synced_at ASC
            ",
        ))
        .bind(entity.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SyncRecordRow::into_record).collect()
    }

    /// Aggregate counts grouped by entity kind and status.
    #[instrument(skip(self))]
    pub async fn status_counts(&self) -> DbResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r"
            SELECT entity_type, status, COUNT(*) AS count
            FROM xero_sync_records
            GROUP BY entity_type, status
            ORDER BY entity_type, status
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StatusCountRow::into_count).collect()
    }

    /// Remove every record. Irreversible; only the reset action calls this.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM xero_sync_records")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Database row for a sync record.
#[derive(Debug, sqlx::FromRow)]
struct SyncRecordRow {
    id: Uuid,
    entity_type: String,
    ninja_id: String,
    xero_id: Option<String>,
    status: String,
    error_message: Option<String>,
    retry_count: i32,
    synced_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SyncRecordRow {
    fn into_record(self) -> DbResult<SyncRecord> {
        let entity_type = self
            .entity_type
            .parse::<EntityKind>()
            .map_err(DbError::CorruptRow)?;
        let status = self
            .status
            .parse::<RecordStatus>()
            .map_err(DbError::CorruptRow)?;

        Ok(SyncRecord {
            id: self.id,
            entity_type,
            ninja_id: self.ninja_id,
            xero_id: self.xero_id,
            status,
            error_message: self.error_message,
            retry_count: self.retry_count,
            synced_at: self.synced_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    entity_type: String,
    status: String,
    count: i64,
}

impl StatusCountRow {
    fn into_count(self) -> DbResult<StatusCount> {
        Ok(StatusCount {
            entity_type: self
                .entity_type
                .parse::<EntityKind>()
                .map_err(DbError::CorruptRow)?,
            status: self
                .status
                .parse::<RecordStatus>()
                .map_err(DbError::CorruptRow)?,
            count: self.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let row = SyncRecordRow {
            id: Uuid::new_v4(),
            entity_type: "invoice".to_string(),
            ninja_id: "inv_1".to_string(),
            xero_id: Some("x-1".to_string()),
            status: "synced".to_string(),
            error_message: None,
            retry_count: 0,
            synced_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let record = row.into_record().unwrap();
        assert_eq!(record.entity_type, EntityKind::Invoice);
        assert_eq!(record.status, RecordStatus::Synced);
        assert_eq!(record.xero_id.as_deref(), Some("x-1"));
    }

    #[test]
    fn test_corrupt_row_rejected() {
        let now = Utc::now();
        let row = SyncRecordRow {
            id: Uuid::new_v4(),
            entity_type: "ledger".to_string(),
            ninja_id: "inv_1".to_string(),
            xero_id: None,
            status: "synced".to_string(),
            error_message: None,
            retry_count: 0,
            synced_at: None,
            created_at: now,
            updated_at: now,
        };

        assert!(matches!(row.into_record(), Err(DbError::CorruptRow(_))));
    }
}
