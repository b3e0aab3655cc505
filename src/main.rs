//! Main entry point for the crdt-text sync host.
//!
//! This binary hosts one shared document and lets editors synchronize with it
//! over websockets, using the Axum web framework.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crdt_text::server::{AppState, create_router};
use crdt_text::{Document, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    let document = Arc::new(Document::new(config.document.clone()));
    info!(replica = document.replica_id(), "Starting crdt-text sync host...");

    let app = create_router(AppState::new(document, config.channel_capacity));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  GET  /text   - Current document text");
    info!("  GET  /ws     - Sync websocket");

    axum::serve(listener, app).await?;
    Ok(())
}
