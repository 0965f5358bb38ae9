//! HTTP surface of the bridge.
//!
//! # Endpoints
//!
//! - `POST /exchange/:kind` - send one hex-encoded datagram, unframed
//! - `GET /exchange/:kind` - receive one datagram, hex-encoded
//! - `POST /raw/:kind` - framed exchange of a binary message
//! - `GET /health` - liveness probe
//!
//! Exchanges block on the emulator, so handlers hand them to
//! `spawn_blocking`. The per-channel lock inside [`Bridge`] serializes
//! requests for the same channel.

mod handlers;
mod routes;

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use kkbridge_frame::HEADER_SIZE;
use kkbridge_link::Bridge;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{ApiError, HexData};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    bridge: Bridge,
    body_limit: usize,
}

impl AppState {
    /// Wrap a connected bridge. Request bodies are capped at one maximal
    /// message (`max_payload_size` plus the header).
    pub fn new(bridge: Bridge, max_payload_size: usize) -> Self {
        Self {
            bridge,
            body_limit: max_payload_size.saturating_add(HEADER_SIZE),
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

/// Build the router with tracing and body limits applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .merge(routes::bridge_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves. In-flight exchanges are allowed to
/// finish.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, version = env!("CARGO_PKG_VERSION"), "bridge listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("bridge stopped");
    Ok(())
}
