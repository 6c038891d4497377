//! Invoice Ninja webhook receiver.
//!
//! Authenticated by the shared `X-Ninja-Token` secret, compared in constant
//! time. The handler acknowledges with 200 as soon as the event is mapped
//! and enqueued; sync outcomes never flow back to the sender. Anything that
//! goes wrong after authentication still returns 200 — Invoice Ninja
//! disables webhooks that keep failing, and a dropped event is recovered by
//! the next reconciliation run.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use ledgersync_engine::SyncTask;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

/// Header carrying the shared webhook secret.
const TOKEN_HEADER: &str = "x-ninja-token";

/// An Invoice Ninja webhook delivery.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `create_invoice`.
    #[serde(default)]
    pub event: String,
    /// Source entity id, when delivered at the top level.
    #[serde(default)]
    pub id: String,
    /// Entity payload; only its `id` is consulted — the engine re-fetches
    /// the entity so it never acts on a stale webhook body.
    #[serde(default)]
    pub data: Option<Value>,
}

impl WebhookEvent {
    /// The source entity id, from the top level or the embedded payload.
    fn ninja_id(&self) -> Option<&str> {
        if !self.id.is_empty() {
            return Some(&self.id);
        }
        self.data
            .as_ref()
            .and_then(|d| d.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Map an event name to a background task.
fn task_for_event(event: &str, ninja_id: &str) -> Option<SyncTask> {
    let ninja_id = ninja_id.to_string();
    match event {
        "create_invoice" => Some(SyncTask::InvoiceUpsert {
            ninja_id,
            force_update: false,
        }),
        "update_invoice" => Some(SyncTask::InvoiceUpsert {
            ninja_id,
            force_update: true,
        }),
        "delete_invoice" => Some(SyncTask::InvoiceDelete { ninja_id }),
        "create_payment" => Some(SyncTask::PaymentUpsert {
            ninja_id,
            force_update: false,
        }),
        "update_payment" => Some(SyncTask::PaymentUpsert {
            ninja_id,
            force_update: true,
        }),
        _ => None,
    }
}

/// Constant-time comparison; also false on length mismatch.
fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Receive an Invoice Ninja webhook event.
#[utoipa::path(
    post,
    path = "/api/webhooks/invoice-ninja",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 401, description = "Missing or invalid X-Ninja-Token"),
    )
)]
pub async fn handle_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> ApiResult<Json<Value>> {
    let Some(expected) = state.secrets.webhook_secret.as_deref() else {
        warn!("Webhook delivery rejected: no webhook secret configured");
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !secret_matches(presented, expected) {
        warn!("Webhook delivery rejected: secret mismatch");
        return Err(ApiError::Unauthorized);
    }

    // Everything past authentication acknowledges with 200.

    if !state.engine.auto_sync_enabled().await {
        info!(event = %event.event, "Webhook ignored: auto sync disabled");
        return Ok(Json(json!({ "status": "ignored" })));
    }

    let Some(ninja_id) = event.ninja_id() else {
        warn!(event = %event.event, "Webhook event carried no entity id");
        return Ok(Json(json!({ "status": "ignored" })));
    };

    let Some(task) = task_for_event(&event.event, ninja_id) else {
        info!(event = %event.event, "Unhandled webhook event");
        return Ok(Json(json!({ "status": "ignored" })));
    };

    info!(event = %event.event, ninja_id, "Webhook event enqueued");
    state.queue.enqueue(task);
    Ok(Json(json!({ "status": "accepted" })))
}
