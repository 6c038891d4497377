//! Entity kinds and sync record statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source entity tracked in the sync ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A client/customer in the source system.
    Client,
    /// An invoice in the source system.
    Invoice,
    /// A payment in the source system.
    Payment,
}

impl EntityKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Invoice => "invoice",
            EntityKind::Payment => "payment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(EntityKind::Client),
            "invoice" => Ok(EntityKind::Invoice),
            "payment" => Ok(EntityKind::Payment),
            _ => Err(format!("Unknown entity kind: {s}")),
        }
    }
}

/// Status of a sync record.
///
/// `Pending` exists only transiently between the first attempt starting and
/// its outcome being written; `Skipped` is terminal and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// First attempt in flight, outcome not yet recorded.
    Pending,
    /// Mirrored into the external ledger; `mirror_id` is set.
    Synced,
    /// Last attempt failed; eligible for reconciliation retry.
    Failed,
    /// Ineligible for sync (draft invoice, unallocated payment). Terminal.
    Skipped,
}

impl RecordStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Synced => "synced",
            RecordStatus::Failed => "failed",
            RecordStatus::Skipped => "skipped",
        }
    }

    /// Check if this status allows a reconciliation retry.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, RecordStatus::Failed)
    }

    /// Check if this is a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Synced | RecordStatus::Skipped)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RecordStatus::Pending),
            "synced" => Ok(RecordStatus::Synced),
            "failed" => Ok(RecordStatus::Failed),
            "skipped" => Ok(RecordStatus::Skipped),
            _ => Err(format!("Unknown record status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trip() {
        for kind in [EntityKind::Client, EntityKind::Invoice, EntityKind::Payment] {
            let parsed: EntityKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("ledger".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_record_status_terminal() {
        assert!(RecordStatus::Synced.is_terminal());
        assert!(RecordStatus::Skipped.is_terminal());
        assert!(!RecordStatus::Failed.is_terminal());
        assert!(RecordStatus::Failed.is_retriable());
        assert!(!RecordStatus::Skipped.is_retriable());
    }
}
