//! Evently HTTP server.

use evently::config::Config;
use evently::server::{AppState, build_router, shutdown_signal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evently=info,evently_auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Evently HTTP Server");

    // Load configuration
    let config = Config::from_env();
    info!(
        backend = ?config.store.backend,
        uploads_dir = %config.uploads.dir.display(),
        token_ttl_days = config.auth.token_ttl_days,
        "Configuration loaded"
    );

    // Stores, services and upload directory
    let state = AppState::from_config(&config).await?;
    let app = build_router(state.clone(), &config.uploads);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "HTTP server listening for requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, closing stores...");
    state.close().await;
    info!("Graceful shutdown complete");

    Ok(())
}
