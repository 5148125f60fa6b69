//! Webhook endpoint handlers.
//!
//! The slash-command handler only sequences two steps:
//! 1. Verify the Slack signature over the raw body
//! 2. Hand the decoded command to the relay
//!
//! A rejected request ends with HTTP 400 and nothing else happens.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::relay::{Relay, SlashCommand};
use crate::web::signature::{self, VerificationResult};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: Config, relay: Relay) -> Self {
        Self {
            config: Arc::new(config),
            relay,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Slash Command
// =============================================================================

/// `/anonymous` slash-command endpoint.
///
/// The body is taken as raw bytes because the signature covers the exact
/// form encoding Slack sent. Fields are decoded only after verification.
pub async fn anonymous_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(signature::SIGNATURE_HEADER),
        has_timestamp = headers.contains_key(signature::TIMESTAMP_HEADER),
        "anonymous_command_received"
    );

    let verdict = signature::verify_now(
        &headers,
        &body,
        &state.config.credentials.signing_secret,
    );

    if let VerificationResult::Rejected(reason) = verdict {
        warn!(reason = %reason, "anonymous_command_rejected");
        return (StatusCode::BAD_REQUEST, reason.to_string()).into_response();
    }

    let command = match SlashCommand::from_form(&body) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "anonymous_command_invalid_form");
            return (StatusCode::BAD_REQUEST, "invalid form body").into_response();
        }
    };

    info!(
        channel_id = %command.channel_id,
        command = %command.command,
        text_length = command.text.len(),
        "anonymous_command_verified"
    );

    let dispatch = state
        .relay
        .spawn(command, state.config.credentials.clone());

    // Dropping the handle leaves the relay running detached
    if state.config.await_dispatch {
        match dispatch.await {
            Ok(outcome) => info!(dispatched = outcome.is_dispatched(), "relay_awaited"),
            Err(e) => error!(error = %e, "relay_task_failed"),
        }
    }

    info!("waiting_for_next_request");

    StatusCode::OK.into_response()
}
