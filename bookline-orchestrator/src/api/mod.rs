//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod call;
pub mod error;
pub mod health;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::context::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Call job endpoints
        .route("/call", post(call::create_call))
        .route("/calls", get(call::list_calls))
        .route("/call/{id}", get(call::get_call))
        // Gateway webhooks
        .route("/call/{id}/decision", post(call::decision_webhook))
        .route("/call/{id}/status/{attempt_index}", post(call::status_webhook))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
