//! yanote API Server Entry Point
//!
//! Reads configuration, opens the configured store and serves the router
//! until Ctrl-C.

use std::sync::Arc;

use yanote_api::{
    create_router, init_tracing, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, DbConfig,
    PgStore, StorageBackend, TelemetryConfig,
};
use yanote_storage::{InMemoryStore, Store};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let api_config = ApiConfig::from_env()?;
    let auth_config = AuthConfig::from_env();
    auth_config
        .check_secret(api_config.is_production())
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let store = open_store(api_config.storage).await?;
    let app = create_router(AppState::new(store, auth_config), &api_config);

    let addr = api_config.socket_addr()?;
    tracing::info!(%addr, storage = ?api_config.storage, "Starting yanote API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(backend: StorageBackend) -> ApiResult<Arc<dyn Store>> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PgStore::from_config(&DbConfig::from_env())?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
