//! Engine error types.
//!
//! These never cross an orchestrator boundary: the public `sync_*` methods
//! fold them into failed [`ledgersync_core::SyncOutcome`]s after recording
//! them in the sync ledger.

use thiserror::Error;

use ledgersync_core::EntityKind;

/// Errors inside one orchestrator attempt.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Sync ledger / config store failure.
    #[error("Database error: {0}")]
    Db(#[from] ledgersync_db::DbError),

    /// External ledger call failed.
    #[error("{0}")]
    Ledger(#[from] ledgersync_xero::LedgerError),

    /// Source system fetch failed.
    #[error("{0}")]
    Source(#[from] ledgersync_ninja::NinjaError),

    /// No valid tokens; the integration is connected to nothing.
    #[error("Xero not connected")]
    NotConnected,

    /// A required upstream entity is not mirrored yet.
    #[error("{entity} {id} not synced: {reason}")]
    Dependency {
        /// Kind of the missing dependency.
        entity: EntityKind,
        /// Source id of the missing dependency.
        id: String,
        /// Why it is unresolved.
        reason: String,
    },
}

impl EngineError {
    /// Create a dependency error.
    pub fn dependency(entity: EntityKind, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dependency {
            entity,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine internals.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_message_names_the_dependency() {
        let err = EngineError::dependency(EntityKind::Client, "c1", "draft client");
        assert_eq!(err.to_string(), "client c1 not synced: draft client");
    }
}
