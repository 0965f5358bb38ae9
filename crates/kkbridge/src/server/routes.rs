//! Route definitions.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::AppState;

pub fn bridge_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        // Legacy hex surface
        .route(
            "/exchange/:kind",
            get(handlers::legacy_read).post(handlers::legacy_write),
        )
        .route("/raw/:kind", post(handlers::raw_exchange))
}
