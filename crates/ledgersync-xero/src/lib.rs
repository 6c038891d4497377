//! # LedgerSync Xero
//!
//! The external-ledger side of the sync engine:
//!
//! - [`types`]: Xero wire shapes (contact, invoice, payment, statuses).
//! - [`mapper`]: pure source→ledger transformations, no I/O.
//! - [`client`]: a typed HTTP wrapper over the Xero accounting API behind
//!   the [`Ledger`] trait, constructed only from valid vault tokens.
//!
//! `XeroClient::connect` returning `None` means "not connected"; callers
//! abort the current operation rather than retrying construction.

pub mod client;
pub mod error;
pub mod mapper;
pub mod types;

pub use client::{FoundInvoice, Ledger, LedgerProvider, XeroClient, XeroProvider};
pub use error::{LedgerError, LedgerResult};
pub use types::{
    XeroContact, XeroContactRef, XeroInvoice, XeroInvoiceStatus, XeroLineItem, XeroPayment,
};
