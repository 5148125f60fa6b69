//! Outbound client for Slack's `chat.postMessage`.
//!
//! One pooled HTTP client is shared by every request. Each relay is a single
//! POST with a bounded timeout and no retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::types::{OutboundMessage, RelayError, RelayOutcome, SlackApiResponse, SlashCommand};
use crate::config::Credentials;

/// Cloneable handle for posting relayed messages.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    client: Client,
    api_url: String,
}

impl Relay {
    /// Create a relay posting to `api_url` with the given per-call timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(RelayInner {
                client,
                api_url: api_url.into(),
            }),
        })
    }

    /// Post the command's text to its channel.
    pub async fn relay(&self, command: &SlashCommand, credentials: &Credentials) -> RelayOutcome {
        let message = OutboundMessage::from(command);

        match self.post_message(&message, &credentials.bot_token).await {
            Ok(()) => {
                info!(
                    channel = %message.channel,
                    text_length = message.text.len(),
                    "relay_dispatched"
                );
                RelayOutcome::Dispatched
            }
            Err(cause) => {
                error!(
                    channel = %message.channel,
                    error = %cause,
                    "relay_dispatch_failed"
                );
                RelayOutcome::DispatchFailed { cause }
            }
        }
    }

    /// Run [`Relay::relay`] as a background task.
    ///
    /// Dropping the handle detaches the task; its outcome is then only
    /// visible in the logs.
    pub fn spawn(&self, command: SlashCommand, credentials: Credentials) -> JoinHandle<RelayOutcome> {
        let relay = self.clone();
        tokio::spawn(async move { relay.relay(&command, &credentials).await })
    }

    async fn post_message(&self, message: &OutboundMessage, bot_token: &str) -> Result<(), RelayError> {
        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .bearer_auth(bot_token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        // Slack reports most failures as 200 with `ok: false`
        let body = response.bytes().await?;
        if let Ok(api) = serde_json::from_slice::<SlackApiResponse>(&body) {
            if !api.ok {
                return Err(RelayError::Api(
                    api.error.unwrap_or_else(|| "unknown_error".to_string()),
                ));
            }
        }

        Ok(())
    }
}
