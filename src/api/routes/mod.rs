//! API routes module

pub mod webhook;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::{Router, routing::get};

type SharedState = Arc<RwLock<AppState>>;

/// Liveness probe
async fn health() -> &'static str {
    "ok"
}

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Deploy probes
        .route("/health", get(health))
        // Provider webhook routes
        .nest("/webhook", webhook::router())
}
