//! Xero OAuth connect flow.
//!
//! `GET /api/admin/xero-connect` sends the admin to Xero's consent page
//! with a random `state` mirrored in an httpOnly cookie (double-submit,
//! compared in constant time on the way back). `GET /api/admin/xero-callback`
//! exchanges the authorization code through the vault, which encrypts and
//! persists the token set. `DELETE /api/admin/xero-connect` drops the
//! stored tokens.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::AdminSession;
use crate::state::ApiState;

/// Cookie mirroring the OAuth `state` parameter.
const STATE_COOKIE: &str = "xero_oauth_state";

/// State cookie lifetime: the admin has ten minutes to finish consent.
const STATE_MAX_AGE_SECS: u32 = 600;

fn new_state_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn state_cookie(value: &str, max_age: u32) -> String {
    format!("{STATE_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/api/admin; Max-Age={max_age}")
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

/// Start the OAuth connect flow.
#[utoipa::path(
    get,
    path = "/api/admin/xero-connect",
    tag = "Admin",
    responses(
        (status = 307, description = "Redirect to the Xero consent page"),
        (status = 400, description = "Integration not configured"),
        (status = 401, description = "No valid admin session"),
    )
)]
pub async fn begin_authorization(
    State(state): State<ApiState>,
    session: AdminSession,
) -> ApiResult<Response> {
    if !state.vault.is_configured() {
        return Err(ApiError::bad_request("Xero integration not configured"));
    }

    let token = new_state_token();
    let redirect = state.vault.oauth().authorize_redirect(&token);
    info!(admin = %session.subject, "Starting Xero authorization");

    Ok((
        [(
            header::SET_COOKIE,
            state_cookie(&token, STATE_MAX_AGE_SECS),
        )],
        Redirect::temporary(&redirect),
    )
        .into_response())
}

/// Query parameters Xero sends back to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code to exchange.
    #[serde(default)]
    pub code: String,
    /// Echoed state parameter.
    #[serde(default)]
    pub state: String,
}

/// Finish the OAuth connect flow.
#[utoipa::path(
    get,
    path = "/api/admin/xero-callback",
    tag = "Admin",
    responses(
        (status = 200, description = "Connected; reports the tenant"),
        (status = 400, description = "State mismatch or missing code"),
        (status = 401, description = "No valid admin session"),
    )
)]
pub async fn complete_authorization(
    State(state): State<ApiState>,
    session: AdminSession,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    let expected = cookie_value(&headers, STATE_COOKIE)
        .ok_or_else(|| ApiError::bad_request("Missing authorization state"))?;
    let state_ok: bool = params
        .state
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into();
    if !state_ok {
        warn!(admin = %session.subject, "OAuth state mismatch on callback");
        return Err(ApiError::bad_request("Authorization state mismatch"));
    }
    if params.code.is_empty() {
        return Err(ApiError::bad_request("Missing authorization code"));
    }

    let connection = state.vault.complete_authorization(&params.code).await?;
    info!(admin = %session.subject, tenant = %connection.tenant_name, "Xero connected");

    Ok((
        [(header::SET_COOKIE, state_cookie("", 0))],
        Json(json!({
            "connected": true,
            "tenant_id": connection.tenant_id,
            "tenant_name": connection.tenant_name,
        })),
    )
        .into_response())
}

/// Disconnect from Xero by deleting the stored tokens.
///
/// Already-mirrored entities keep their sync records; only the credentials
/// go away.
#[utoipa::path(
    delete,
    path = "/api/admin/xero-connect",
    tag = "Admin",
    responses(
        (status = 200, description = "Disconnected (or was never connected)"),
        (status = 401, description = "No valid admin session"),
    )
)]
pub async fn disconnect(
    State(state): State<ApiState>,
    session: AdminSession,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = state.vault.delete_tokens(None).await?;
    info!(admin = %session.subject, removed, "Xero disconnected");
    Ok(Json(json!({ "disconnected": removed })))
}
