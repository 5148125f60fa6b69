//! Message types for the inbound slash command and the outbound post.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Inbound Slash Command
// =============================================================================

/// Fields of a Slack slash-command invocation.
///
/// Slack sends these form-encoded. Only `channel_id` and `text` are relayed;
/// the rest are kept for logging and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlashCommand {
    /// Conversation the command was typed in
    #[serde(default)]
    pub channel_id: String,
    /// Everything after the command name
    #[serde(default)]
    pub text: String,
    /// Command name, e.g. `/anonymous`
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub team_domain: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub api_app_id: Option<String>,
}

impl SlashCommand {
    /// Decode a form-encoded body. Unknown fields are ignored; a repeated
    /// known field is an error.
    pub fn from_form(raw_body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes(raw_body)
    }
}

// =============================================================================
// Outbound Message
// =============================================================================

/// Body of a `chat.postMessage` call.
///
/// Built 1:1 from the slash command; content is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
}

impl From<&SlashCommand> for OutboundMessage {
    fn from(command: &SlashCommand) -> Self {
        Self {
            channel: command.channel_id.clone(),
            text: command.text.clone(),
        }
    }
}

/// The parts of a Slack Web API response the relay inspects.
#[derive(Debug, Deserialize)]
pub struct SlackApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Outcome
// =============================================================================

/// Why a dispatch failed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request to messaging API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("messaging API returned HTTP {0}")]
    Status(u16),

    #[error("messaging API rejected the message: {0}")]
    Api(String),
}

/// Result of one relay attempt. Failures are reported, never retried.
#[derive(Debug)]
pub enum RelayOutcome {
    Dispatched,
    DispatchFailed { cause: RelayError },
}

impl RelayOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, RelayOutcome::Dispatched)
    }
}
