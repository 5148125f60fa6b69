//! Web server module for the `/anonymous` slash command.
//!
//! This module provides a small web server that:
//! - Receives slash-command webhooks from Slack
//! - Verifies the request signature and timestamp
//! - Relays the command text to the originating channel
//! - Answers 400 on any verification failure

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{anonymous_command, health, AppState, HealthResponse};
pub use signature::{verify, verify_now, RejectReason, VerificationResult};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/anonymous", post(anonymous_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
