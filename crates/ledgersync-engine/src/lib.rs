//! # LedgerSync Engine
//!
//! The sync orchestrators and reconciliation driver. Each orchestrator
//! implements get-or-create idempotent synchronization for one entity type:
//!
//! 1. consult the sync ledger (short-circuit on `synced`),
//! 2. resolve dependencies sequentially (invoice needs client, payment
//!    needs invoice),
//! 3. call the external ledger,
//! 4. record the outcome.
//!
//! Orchestrators never propagate errors past their boundary: every path
//! folds into a [`SyncOutcome`], and failures land in the sync ledger where
//! reconciliation picks them up. There is no lock across concurrent
//! triggers; correctness rests on upsert-by-natural-key plus idempotent
//! ledger lookups.

pub mod engine;
pub mod error;
pub mod queue;
pub mod reconcile;
pub mod store;

pub use engine::SyncEngine;
pub use error::{EngineError, EngineResult};
pub use queue::{SyncQueue, SyncTask};
pub use reconcile::{
    BulkSummary, EntityTally, ReconcileSummary, ResetSummary, CRON_RETRY_CEILING,
    MANUAL_RETRY_CEILING,
};
pub use store::{SettingsSource, SyncLedger};
