//! The uniform outcome type returned by every sync orchestrator.

use serde::{Deserialize, Serialize};

/// Result of one orchestrator invocation for one source entity.
///
/// Orchestrators never propagate errors past their boundary; every path,
/// including infrastructure failure, folds into one of these. A skipped
/// entity is a *successful* outcome with a note, so batch callers can keep
/// going without special-casing ineligible entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the entity is now in a settled state (synced or skipped).
    pub success: bool,
    /// Identifier in the external ledger, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_id: Option<String>,
    /// Human-readable note: skip reason on success, error detail on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncOutcome {
    /// Entity was mirrored (or already was); `mirror_id` is the ledger id.
    #[must_use]
    pub fn synced(mirror_id: impl Into<String>) -> Self {
        Self {
            success: true,
            mirror_id: Some(mirror_id.into()),
            message: None,
        }
    }

    /// Entity is ineligible and was recorded as skipped.
    #[must_use]
    pub fn skipped(note: impl Into<String>) -> Self {
        Self {
            success: true,
            mirror_id: None,
            message: Some(note.into()),
        }
    }

    /// The whole integration is unconfigured; nothing was attempted.
    #[must_use]
    pub fn noop(note: impl Into<String>) -> Self {
        Self {
            success: true,
            mirror_id: None,
            message: Some(note.into()),
        }
    }

    /// The attempt failed; the failure is recorded in the sync ledger.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            mirror_id: None,
            message: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let ok = SyncOutcome::synced("xero-123");
        assert!(ok.success);
        assert_eq!(ok.mirror_id.as_deref(), Some("xero-123"));

        let skip = SyncOutcome::skipped("Skipped draft invoice");
        assert!(skip.success);
        assert!(skip.mirror_id.is_none());
        assert_eq!(skip.message.as_deref(), Some("Skipped draft invoice"));

        let err = SyncOutcome::failed("Xero not connected");
        assert!(!err.success);
        assert_eq!(err.message.as_deref(), Some("Xero not connected"));
    }
}
