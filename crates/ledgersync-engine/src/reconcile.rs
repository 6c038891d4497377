//! Reconciliation, bulk backfill, and reset.
//!
//! Bulk operations serialize explicitly: a fixed awaited delay between
//! entities keeps the total ledger call rate under Xero's per-minute quota
//! (each entity sync can issue 2–3 API calls). There is no parallel fan-out
//! anywhere in this module.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use ledgersync_core::EntityKind;

use crate::engine::SyncEngine;
use crate::error::{EngineError, EngineResult};

/// Fixed inter-entity delay during bulk sync (rate-limit safety margin).
const BULK_SYNC_DELAY: Duration = Duration::from_secs(2);

/// Retry ceiling used by the scheduled daily reconciliation.
pub const CRON_RETRY_CEILING: i32 = 3;

/// Retry ceiling used by the manual reconcile action.
pub const MANUAL_RETRY_CEILING: i32 = 5;

/// Per-entity reconciliation tally.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EntityTally {
    /// Entities attempted (or examined, for bulk).
    pub attempted: u32,
    /// Entities now synced.
    pub succeeded: u32,
    /// Entities skipped (draft, already synced, ineligible).
    pub skipped: u32,
    /// Entities that failed again.
    pub failed: u32,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileSummary {
    /// Invoice retries.
    pub invoices: EntityTally,
    /// Payment retries.
    pub payments: EntityTally,
}

impl ReconcileSummary {
    /// Whether any retry failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.invoices.failed > 0 || self.payments.failed > 0
    }
}

/// Summary of one bulk backfill run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BulkSummary {
    /// Invoice backfill.
    pub invoices: EntityTally,
    /// Payment backfill.
    pub payments: EntityTally,
}

/// Summary of a destructive reset.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ResetSummary {
    /// Mirrored invoices voided in the ledger.
    pub voided: u32,
    /// Mirrored invoices that could not be voided.
    pub void_failed: u32,
    /// Sync records removed.
    pub records_cleared: u64,
}

impl SyncEngine {
    /// Re-attempt failed syncs below the retry ceiling.
    ///
    /// Processes up to 50 oldest-first records per entity type. A failure on
    /// one record never aborts the rest of the batch.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, max_retries: i32) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        summary.invoices = self.reconcile_entity(EntityKind::Invoice, max_retries).await;
        summary.payments = self.reconcile_entity(EntityKind::Payment, max_retries).await;

        if let Err(e) = self.config().touch_last_reconciliation(Utc::now()).await {
            warn!(error = %e, "Could not record reconciliation timestamp");
        }

        info!(
            invoices_succeeded = summary.invoices.succeeded,
            invoices_failed = summary.invoices.failed,
            payments_succeeded = summary.payments.succeeded,
            payments_failed = summary.payments.failed,
            "Reconciliation run complete"
        );
        summary
    }

    async fn reconcile_entity(&self, entity: EntityKind, max_retries: i32) -> EntityTally {
        let mut tally = EntityTally::default();

        let records = match self.records().failed_records(entity, max_retries).await {
            Ok(records) => records,
            Err(e) => {
                warn!(entity = %entity, error = %e, "Could not load failed records");
                return tally;
            }
        };

        for record in records {
            tally.attempted += 1;
            let outcome = match entity {
                EntityKind::Invoice => self.sync_invoice_by_id(&record.ninja_id, false).await,
                EntityKind::Payment => self.sync_payment_by_id(&record.ninja_id, false).await,
                // Clients are reconciled transitively through their invoices.
                EntityKind::Client => continue,
            };
            if outcome.success {
                tally.succeeded += 1;
            } else {
                tally.failed += 1;
            }
        }

        tally
    }

    /// Backfill every source invoice and payment into the ledger.
    ///
    /// Drafts and already-synced ids are skipped; the remainder is processed
    /// sequentially with a fixed delay between entities.
    #[instrument(skip(self))]
    pub async fn bulk_sync(&self, since: Option<NaiveDate>) -> EngineResult<BulkSummary> {
        let mut summary = BulkSummary::default();

        let synced_invoices = self.records().synced_source_ids(EntityKind::Invoice).await?;
        let invoices = self.source().list_invoices(since).await?;
        for invoice in invoices {
            summary.invoices.attempted += 1;

            if invoice.is_draft() || synced_invoices.contains(&invoice.id) {
                summary.invoices.skipped += 1;
                continue;
            }

            let outcome = self.sync_invoice(&invoice, false).await;
            if outcome.success {
                if outcome.mirror_id.is_some() {
                    summary.invoices.succeeded += 1;
                } else {
                    summary.invoices.skipped += 1;
                }
            } else {
                summary.invoices.failed += 1;
            }

            sleep(BULK_SYNC_DELAY).await;
        }

        let synced_payments = self.records().synced_source_ids(EntityKind::Payment).await?;
        let payments = self.source().list_payments(since).await?;
        for payment in payments {
            summary.payments.attempted += 1;

            if payment.invoices.is_empty() || synced_payments.contains(&payment.id) {
                summary.payments.skipped += 1;
                continue;
            }

            let outcome = self.sync_payment(&payment, false).await;
            if outcome.success {
                if outcome.mirror_id.is_some() {
                    summary.payments.succeeded += 1;
                } else {
                    summary.payments.skipped += 1;
                }
            } else {
                summary.payments.failed += 1;
            }

            sleep(BULK_SYNC_DELAY).await;
        }

        info!(
            invoices_synced = summary.invoices.succeeded,
            invoices_skipped = summary.invoices.skipped,
            payments_synced = summary.payments.succeeded,
            payments_skipped = summary.payments.skipped,
            "Bulk sync complete"
        );
        Ok(summary)
    }

    /// Void every mirrored invoice and truncate the sync ledger.
    ///
    /// Irreversible; intended only for recovering from a corrupted bulk
    /// sync. Requires a live ledger connection — without one nothing is
    /// voided and nothing is cleared.
    #[instrument(skip(self))]
    pub async fn reset_sync(&self) -> EngineResult<ResetSummary> {
        let ledger = self
            .provider()
            .connect()
            .await?
            .ok_or(EngineError::NotConnected)?;

        let mut summary = ResetSummary::default();

        let synced = self.records().synced_records(EntityKind::Invoice).await?;
        for record in synced {
            let Some(xero_id) = record.xero_id else {
                continue;
            };
            match ledger.void_invoice(&xero_id).await {
                Ok(()) => summary.voided += 1,
                Err(e) => {
                    warn!(ninja_id = %record.ninja_id, xero_id = %xero_id, error = %e, "Void failed during reset");
                    summary.void_failed += 1;
                }
            }
            sleep(BULK_SYNC_DELAY).await;
        }

        summary.records_cleared = self.records().clear().await?;

        info!(
            voided = summary.voided,
            void_failed = summary.void_failed,
            records_cleared = summary.records_cleared,
            "Sync state reset"
        );
        Ok(summary)
    }
}
