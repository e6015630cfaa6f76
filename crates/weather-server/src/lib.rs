//! HTTP surface of the weather block service
//!
//! Serves the city autocomplete, the weather settings and city import
//! endpoints, read-only city pages and rendered weather blocks.

pub mod rejection;
pub mod routes;
pub mod state;

pub use rejection::{handle_rejection, status_for, ApiError};
pub use routes::routes;
pub use state::AppState;

use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Serve all routes on `host:port` until Ctrl+C.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Weather block server listening on http://{}", bound);
    server.await;
    tracing::info!("Server stopped");
    Ok(())
}
