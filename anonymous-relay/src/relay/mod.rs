//! Relay module for forwarding verified slash commands to Slack.
//!
//! ## Flow
//!
//! ```text
//! SlashCommand → OutboundMessage → POST chat.postMessage → RelayOutcome
//! ```

pub mod client;
pub mod types;

pub use client::Relay;
pub use types::{OutboundMessage, RelayError, RelayOutcome, SlackApiResponse, SlashCommand};
