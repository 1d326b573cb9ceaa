//! Entry point for the `enclave-gateway` HTTP server.

use std::sync::Arc;

use enclave_gateway::{config::GatewayConfig, routes::create_router};
use enclave_store::{DirectoryProvisioner, LocalWorkspaceStore, WorkspaceStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match GatewayConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let store = match LocalWorkspaceStore::open(&config.workspace_root, DirectoryProvisioner::new()).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(root = %config.workspace_root.display(), error = %e, "failed to open workspace store");
            std::process::exit(1);
        }
    };
    let app = create_router(store.clone(), config.max_upload_bytes);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.listen_addr, root = %store.root().display(), "enclave-gateway listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = store.reset().await {
        tracing::error!(error = %e, "failed to reset workspace store on shutdown");
    }
    if let Err(e) = served {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
    info!("enclave-gateway stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
