//! # LedgerSync Core
//!
//! Shared vocabulary for the Invoice Ninja → Xero synchronization engine:
//! entity kinds, sync record statuses, and the uniform outcome type every
//! orchestrator returns.
//!
//! This crate is deliberately dependency-light so that every other crate in
//! the workspace can use these types without pulling in I/O machinery.

pub mod outcome;
pub mod types;

pub use outcome::SyncOutcome;
pub use types::{EntityKind, RecordStatus};
