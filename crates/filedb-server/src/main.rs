//! Binary entrypoint for the filedb HTTP server.
//!
//! Configuration comes from environment variables (see
//! [`filedb_server::config`]). On Ctrl-C the server stops accepting requests
//! and closes the store, which flushes every pending change to disk.

use std::sync::Arc;

use filedb_server::config::ServerConfig;
use filedb_server::router::build_router;
use filedb_server::state::AppState;
use filedb_storage::FileStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env().expect("Invalid server configuration");

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).expect("Failed to create store directory");
        }
    }

    let store = Arc::new(
        FileStore::open(&config.db_path, config.flush).expect("Failed to open record store"),
    );
    tracing::info!(path = %config.db_path.display(), "record store opened");

    let app = build_router(AppState::new(store.clone()));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("filedb server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("server stopped, flushing record store");
    match tokio::task::spawn_blocking(move || store.close()).await {
        Ok(Ok(())) => tracing::info!("record store flushed"),
        Ok(Err(err)) => tracing::error!(error = %err, "final flush failed"),
        Err(err) => tracing::error!(error = %err, "close task panicked"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
