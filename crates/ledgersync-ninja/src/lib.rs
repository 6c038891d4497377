//! # LedgerSync Ninja
//!
//! Wire types and a typed fetch client for Invoice Ninja, the invoicing
//! system of record. The sync engine consumes these shapes; it never writes
//! back to the source system.
//!
//! The [`SourceFeed`] trait is the seam the orchestrators depend on, so
//! tests can substitute an in-memory feed.

pub mod client;
pub mod error;
pub mod types;

pub use client::{NinjaClient, SourceFeed};
pub use error::{NinjaError, NinjaResult};
pub use types::{
    PaymentAllocation, SourceClient, SourceContact, SourceInvoice, SourceInvoiceStatus,
    SourceLineItem, SourcePayment,
};
