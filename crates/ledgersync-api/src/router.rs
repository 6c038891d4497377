//! API route table.
//!
//! - POST /api/webhooks/invoice-ninja — Invoice Ninja event webhook
//! - GET  /api/cron/xero-reconcile — scheduled reconciliation
//! - POST /api/admin/xero-sync — manual sync actions
//! - GET  /api/admin/xero-sync — sync status
//! - GET  /api/admin/xero-connect — start the OAuth connect flow
//! - GET  /api/admin/xero-callback — finish the OAuth connect flow
//! - DELETE /api/admin/xero-connect — disconnect

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::ApiState;
use crate::{admin, connect, cron, webhook};

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/webhooks/invoice-ninja", post(webhook::handle_webhook))
        .route("/api/cron/xero-reconcile", get(cron::run_reconciliation))
        .route(
            "/api/admin/xero-sync",
            post(admin::run_sync_action).get(admin::sync_status),
        )
        .route(
            "/api/admin/xero-connect",
            get(connect::begin_authorization).delete(connect::disconnect),
        )
        .route(
            "/api/admin/xero-callback",
            get(connect::complete_authorization),
        )
        .with_state(state)
}
