//! Manual sync actions and sync status, behind the admin session.

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use ledgersync_engine::MANUAL_RETRY_CEILING;

use crate::error::{ApiError, ApiResult};
use crate::session::AdminSession;
use crate::state::ApiState;

/// Manual sync actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Sync one invoice, pushing changes if it already has a mirror.
    SyncInvoice,
    /// Sync one payment.
    SyncPayment,
    /// Backfill every source invoice and payment.
    BulkSync,
    /// Void every mirror and truncate the sync ledger. Irreversible.
    ResetSync,
    /// Retry failed records at the manual ceiling.
    Reconcile,
}

impl Default for SyncAction {
    fn default() -> Self {
        Self::Reconcile
    }
}

/// Request body for the manual sync endpoint.
#[derive(Debug, Deserialize)]
pub struct SyncActionRequest {
    /// Action to run; reconcile when omitted.
    #[serde(default)]
    pub action: SyncAction,
    /// Target entity id; required for the single-entity actions.
    #[serde(default)]
    pub ninja_id: Option<String>,
    /// Lower bound for bulk sync (YYYY-MM-DD).
    #[serde(default)]
    pub since_date: Option<NaiveDate>,
}

impl SyncActionRequest {
    fn require_ninja_id(&self) -> Result<&str, ApiError> {
        self.ninja_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("ninja_id is required for this action"))
    }
}

/// Run one manual sync action.
///
/// Runs inline rather than through the background queue: the admin is
/// watching and wants the outcome in the response.
#[utoipa::path(
    post,
    path = "/api/admin/xero-sync",
    tag = "Admin",
    responses(
        (status = 200, description = "Action result"),
        (status = 400, description = "Missing ninja_id"),
        (status = 401, description = "No valid admin session"),
    )
)]
pub async fn run_sync_action(
    State(state): State<ApiState>,
    session: AdminSession,
    Json(request): Json<SyncActionRequest>,
) -> ApiResult<Json<Value>> {
    info!(admin = %session.subject, action = ?request.action, "Manual sync action");

    let result = match request.action {
        SyncAction::SyncInvoice => {
            let ninja_id = request.require_ninja_id()?;
            let outcome = state.engine.sync_invoice_by_id(ninja_id, true).await;
            json!({ "outcome": outcome })
        }
        SyncAction::SyncPayment => {
            let ninja_id = request.require_ninja_id()?;
            let outcome = state.engine.sync_payment_by_id(ninja_id, true).await;
            json!({ "outcome": outcome })
        }
        SyncAction::BulkSync => {
            let summary = state.engine.bulk_sync(request.since_date).await?;
            json!({ "invoices": summary.invoices, "payments": summary.payments })
        }
        SyncAction::ResetSync => {
            let summary = state.engine.reset_sync().await?;
            json!({
                "voided": summary.voided,
                "void_failed": summary.void_failed,
                "records_cleared": summary.records_cleared,
            })
        }
        SyncAction::Reconcile => {
            let summary = state.engine.reconcile(MANUAL_RETRY_CEILING).await;
            json!({ "invoices": summary.invoices, "payments": summary.payments })
        }
    };

    Ok(Json(json!({ "action": request.action, "result": result })))
}

/// Sync status: record counts per entity type and status, plus connection
/// info for the back-office page.
#[utoipa::path(
    get,
    path = "/api/admin/xero-sync",
    tag = "Admin",
    responses(
        (status = 200, description = "Sync status"),
        (status = 401, description = "No valid admin session"),
    )
)]
pub async fn sync_status(
    State(state): State<ApiState>,
    _session: AdminSession,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let counts = state.records.status_counts().await?;
    let connection = state.vault.connection_status().await?;
    let auto_sync = state.engine.auto_sync_enabled().await;

    Ok((
        StatusCode::OK,
        Json(json!({
            "configured": state.engine.is_configured(),
            "connected": connection.is_some(),
            "connection": connection,
            "auto_sync_enabled": auto_sync,
            "counts": counts,
        })),
    ))
}
