//! Storefront Backend
//! Mission: Serve the product catalog behind stateless bearer-token authentication

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_backend::{api::create_router, build_state, clock::SystemClock, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing();

    info!("🚀 Storefront backend starting");

    let state = build_state(&config, Arc::new(SystemClock))?;
    info!(
        "🔐 Auth ready: account {} with roles {:?}, token ttl {}s",
        config.username,
        config.roles(),
        config.jwt_ttl_secs
    );

    let app = create_router(state);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!("🎯 API server listening on {}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Shutdown complete");
    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}
