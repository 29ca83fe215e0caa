//! HKids Service - HTTP API for the children's e-book platform
//!
//! This is the main entry point for the hkids service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hkids_service::{create_router, AppState, ServiceConfig};
use hkids_store::{DbEnv, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hkids=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HKids Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        upload_dir = %config.upload_dir,
        "Service configuration loaded"
    );

    // Resolve database configuration; an unusable configuration (e.g. an
    // empty password) fails here, before any connection is attempted.
    let resolved = match hkids_store::resolve(&DbEnv::from_process()) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(error = %e, "Database configuration is unusable");
            return Err(e.into());
        }
    };

    tracing::info!(database = %resolved.summary(), "Connecting to PostgreSQL");
    let store = match PgStore::connect(&resolved).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            return Err(e.into());
        }
    };

    // Create tables and seed reference data, idempotently
    if let Err(e) = store.init_schema().await {
        tracing::error!(error = %e, "Schema initialization failed");
        return Err(e.into());
    }

    // The upload directory must exist before the first multipart request
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Build app state (starts the page-ingestion worker)
    let state = AppState::new(Arc::new(store), config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
