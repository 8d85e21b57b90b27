//! ChronoBoard - kanban time tracking
//!
//! Headless service shell: wires the application context, runs the keep-alive
//! agent, and parks until interrupted.

use std::sync::Arc;

use chronoboard_app::AppContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "Could not load .env file"),
    }

    tracing::info!("ChronoBoard starting...");

    let ctx = Arc::new(AppContext::new().await?);
    ctx.start_background().await?;

    tracing::info!("ChronoBoard initialized successfully");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    ctx.shutdown().await?;

    Ok(())
}
