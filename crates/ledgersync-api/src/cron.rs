//! Scheduled reconciliation trigger.
//!
//! Invoked daily by an external scheduler with a bearer secret. Runs the
//! retry loop at the cron ceiling and reports the per-entity tallies; a
//! partial failure is a 207 so the scheduler's logs distinguish it from a
//! clean run without treating it as an invocation error.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::warn;

use ledgersync_engine::CRON_RETRY_CEILING;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

/// Extract and verify the bearer secret.
fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        warn!("Cron invocation rejected: no cron secret configured");
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// Run the scheduled reconciliation.
#[utoipa::path(
    get,
    path = "/api/cron/xero-reconcile",
    tag = "Cron",
    responses(
        (status = 200, description = "All retries succeeded or nothing to retry"),
        (status = 207, description = "Some retries failed again"),
        (status = 401, description = "Missing or invalid bearer secret"),
    )
)]
pub async fn run_reconciliation(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&headers, state.secrets.cron_secret.as_deref())?;

    let summary = state.engine.reconcile(CRON_RETRY_CEILING).await;

    let status = if summary.has_failures() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(json!({
            "invoices": summary.invoices,
            "payments": summary.payments,
        })),
    ))
}
