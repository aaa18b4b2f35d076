//! tabletop-network server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tabletop_network::api;
use tabletop_network::app_state::AppState;
use tabletop_network::config::{NetworkConfig, StoreBackend};
use tabletop_network::persistence::{MemoryStore, NetworkStore, PostgresStore};
use tabletop_network::service::{DisabledEmailDelivery, EmailDelivery, HttpEmailDelivery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = NetworkConfig::from_env().map_err(|e| anyhow::anyhow!("config: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting tabletop-network");

    // Build persistence layer
    let mut pg: Option<PostgresStore> = None;
    let store: Arc<dyn NetworkStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(&config)
                .await
                .context("connecting to postgres")?;
            if config.run_migrations {
                store.migrate().await.context("running migrations")?;
            }
            pg = Some(store.clone());
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Email delivery function
    let email: Arc<dyn EmailDelivery> = match &config.email_function_url {
        Some(url) => Arc::new(
            HttpEmailDelivery::new(
                url.as_str(),
                config.email_function_key.clone(),
                config.email_timeout,
            )
            .context("building email client")?,
        ),
        None => {
            tracing::warn!("EMAIL_FUNCTION_URL not set; invites will be marked email_failed");
            Arc::new(DisabledEmailDelivery)
        }
    };

    // Build application state and router
    let app_state = AppState::new(store, email, &config);
    let cache = Arc::clone(app_state.network_service.cache());
    let app = api::build_app(app_state, config.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Cached views are per-process; drop them with the session.
    cache.clear().await;
    if let Some(store) = pg {
        store.close().await;
    }
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
