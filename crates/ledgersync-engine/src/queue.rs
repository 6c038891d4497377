//! Bounded background task queue for webhook-triggered sync.
//!
//! The webhook handler acknowledges the sender immediately and hands the
//! sync to this queue; outcomes surface in the sync ledger and logs, never
//! back to the webhook sender. The channel is bounded so a webhook storm
//! cannot grow memory without limit — on overflow the event is dropped with
//! an error log and left for the next reconciliation run to pick up.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::engine::SyncEngine;

/// Default queue capacity.
const DEFAULT_CAPACITY: usize = 64;

/// One unit of background sync work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTask {
    /// Create or update the mirror of an invoice.
    InvoiceUpsert {
        /// Source invoice id.
        ninja_id: String,
        /// Push changes to an already-synced invoice.
        force_update: bool,
    },
    /// Void the mirror of a deleted invoice.
    InvoiceDelete {
        /// Source invoice id.
        ninja_id: String,
    },
    /// Create the mirror of a payment.
    PaymentUpsert {
        /// Source payment id.
        ninja_id: String,
        /// Forced updates are no-ops for payments; kept for logging.
        force_update: bool,
    },
}

/// Handle for enqueuing background sync work.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    tx: mpsc::Sender<SyncTask>,
}

impl SyncQueue {
    /// Spawn the worker task and return the enqueue handle.
    #[must_use]
    pub fn start(engine: Arc<SyncEngine>) -> Self {
        Self::with_capacity(engine, DEFAULT_CAPACITY)
    }

    /// Spawn with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(engine: Arc<SyncEngine>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run_worker(engine, rx));
        Self { tx }
    }

    /// Enqueue a task without blocking. Returns false when the queue is full
    /// or the worker has stopped; the event is then left to reconciliation.
    pub fn enqueue(&self, task: SyncTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                error!(?task, "Sync queue full; dropping event for reconciliation");
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                error!(?task, "Sync queue worker stopped; dropping event");
                false
            }
        }
    }
}

async fn run_worker(engine: Arc<SyncEngine>, mut rx: mpsc::Receiver<SyncTask>) {
    info!("Sync queue worker started");

    while let Some(task) = rx.recv().await {
        let outcome = match &task {
            SyncTask::InvoiceUpsert {
                ninja_id,
                force_update,
            } => engine.sync_invoice_by_id(ninja_id, *force_update).await,
            SyncTask::InvoiceDelete { ninja_id } => engine.void_deleted_invoice(ninja_id).await,
            SyncTask::PaymentUpsert {
                ninja_id,
                force_update,
            } => engine.sync_payment_by_id(ninja_id, *force_update).await,
        };

        if outcome.success {
            info!(?task, mirror_id = ?outcome.mirror_id, "Background sync settled");
        } else {
            // Recorded in the sync ledger; reconciliation will retry.
            warn!(?task, error = ?outcome.message, "Background sync failed");
        }
    }

    info!("Sync queue worker stopped");
}
