//! # LedgerSync API
//!
//! The HTTP triggers in front of the sync engine:
//!
//! - `POST /api/webhooks/invoice-ninja` — Invoice Ninja event webhook,
//!   shared-secret authenticated, acknowledges immediately and enqueues.
//! - `GET /api/cron/xero-reconcile` — scheduled reconciliation, bearer
//!   secret, 207 when any retry failed.
//! - `POST|GET /api/admin/xero-sync` — manual sync actions and sync status,
//!   behind an admin session cookie.
//! - `GET|DELETE /api/admin/xero-connect`, `GET /api/admin/xero-callback` —
//!   the Xero OAuth connect flow with a CSRF state cookie.
//!
//! Handlers catch broadly: failures return generic bodies and the detail
//! goes to the server log.

pub mod admin;
pub mod connect;
pub mod cron;
pub mod error;
pub mod router;
pub mod session;
pub mod state;
pub mod webhook;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use state::{ApiSecrets, ApiState};
