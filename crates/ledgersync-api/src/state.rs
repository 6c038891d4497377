//! Shared application state for the API routers.

use std::sync::Arc;

use ledgersync_db::SyncRecordStore;
use ledgersync_engine::{SyncEngine, SyncQueue};
use ledgersync_vault::TokenVault;

/// Shared secrets the trigger handlers authenticate against.
#[derive(Clone)]
pub struct ApiSecrets {
    /// `X-Ninja-Token` value expected on webhook deliveries. `None`
    /// rejects every delivery.
    pub webhook_secret: Option<String>,
    /// Bearer secret expected on the cron endpoint. `None` rejects every
    /// invocation.
    pub cron_secret: Option<String>,
    /// HMAC key for the admin session cookie.
    pub session_secret: String,
}

/// State injected into every handler.
#[derive(Clone)]
pub struct ApiState {
    /// The sync engine.
    pub engine: Arc<SyncEngine>,
    /// Background queue fed by the webhook handler.
    pub queue: SyncQueue,
    /// Token vault, for the OAuth connect flow and connection status.
    pub vault: Arc<TokenVault>,
    /// Direct store access for the status aggregation query.
    pub records: SyncRecordStore,
    /// Trigger secrets.
    pub secrets: Arc<ApiSecrets>,
}
