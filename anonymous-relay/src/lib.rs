//! Anonymous Relay - verified Slack slash-command relay.
//!
//! Slack calls `POST /anonymous` when someone types `/anonymous <text>`.
//! The request is authenticated with Slack's signing secret and the text is
//! posted back to the same channel through the bot token, so the message
//! appears without the author's name.
//!
//! ## Architecture
//!
//! ```text
//! Slack → POST /anonymous → signature check → Relay → chat.postMessage
//!                                  └─ reject → 400
//! ```

pub mod config;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, Credentials};
pub use relay::{OutboundMessage, Relay, RelayError, RelayOutcome, SlashCommand};
pub use web::{router, AppState, RejectReason, VerificationResult};
