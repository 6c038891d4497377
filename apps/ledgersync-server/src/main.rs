//! LedgerSync server: mirrors Invoice Ninja invoicing activity into Xero.
//!
//! Wires the token vault, the source and ledger clients, the sync engine,
//! and the HTTP triggers, then serves until SIGTERM.

mod config;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use config::Config;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use ledgersync_api::{ApiSecrets, ApiState};
use ledgersync_db::{
    run_migrations, SyncConfigStore, SyncRecordStore, XeroTokenStore,
};
use ledgersync_engine::{SyncEngine, SyncQueue};
use ledgersync_ninja::NinjaClient;
use ledgersync_vault::{OAuthClient, OAuthConfig, TokenCipher, TokenVault};
use ledgersync_xero::XeroProvider;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Could not connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!(error = %e, "Migrations failed");
        std::process::exit(1);
    }

    let cipher = match TokenCipher::from_hex_key(&config.token_encryption_key) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid token encryption key");
            std::process::exit(1);
        }
    };

    let oauth = OAuthClient::new(OAuthConfig::new(
        config.xero_client_id.clone(),
        config.xero_client_secret.clone(),
        config.xero_redirect_uri.clone(),
    ));
    let vault = Arc::new(TokenVault::new(
        XeroTokenStore::new(pool.clone()),
        cipher,
        oauth,
    ));

    let records = SyncRecordStore::new(pool.clone());
    let settings = SyncConfigStore::new(pool.clone());
    let source = Arc::new(NinjaClient::new(
        config.ninja_api_url.clone(),
        config.ninja_api_token.clone(),
    ));
    let provider = Arc::new(XeroProvider::new(Arc::clone(&vault)));

    let engine = Arc::new(SyncEngine::new(
        Arc::new(records.clone()),
        Arc::new(settings),
        source,
        provider,
    ));
    let queue = SyncQueue::start(Arc::clone(&engine));

    let state = ApiState {
        engine,
        queue,
        vault,
        records,
        secrets: Arc::new(ApiSecrets {
            webhook_secret: config.ninja_webhook_secret.clone(),
            cron_secret: config.cron_secret.clone(),
            session_secret: config.session_secret.clone(),
        }),
    };

    let app = Router::new()
        .route("/health", get(health))
        .merge(ledgersync_api::router(state))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, configured = !config.xero_client_id.is_empty(), "LedgerSync listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Could not bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
