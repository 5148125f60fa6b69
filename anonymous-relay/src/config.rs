//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup. Missing credentials are fatal.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default Slack endpoint for posting messages.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api/chat.postMessage";

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is blank")]
    Blank(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Slack credentials shared read-only by every request.
#[derive(Clone)]
pub struct Credentials {
    /// Shared secret used as the HMAC key for request signatures
    pub signing_secret: String,

    /// Bearer token for the outbound chat.postMessage call
    pub bot_token: String,
}

impl Credentials {
    pub fn new(signing_secret: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            bot_token: bot_token.into(),
        }
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("signing_secret", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,

    /// Port for the web server to listen on
    pub port: u16,

    /// Endpoint the relay posts messages to
    pub slack_api_url: String,

    /// Upper bound on a single outbound dispatch
    pub relay_timeout_ms: u64,

    /// Await the dispatch before answering the webhook
    pub await_dispatch: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_secret = required(&lookup, "SLACK_SIGNING_SECRET")?;
        let bot_token = required(&lookup, "SLACK_BOT_TOKEN")?;

        Ok(Config {
            credentials: Credentials::new(signing_secret, bot_token),

            port: parsed(&lookup, "PORT")?.unwrap_or(8080),

            slack_api_url: lookup("SLACK_API_URL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),

            relay_timeout_ms: relay_timeout_ms(&lookup)?,

            await_dispatch: parse_flag(&lookup, "RELAY_AWAIT_DISPATCH"),
        })
    }

    /// Config with the given credentials and defaults for everything else.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Config {
            credentials,
            port: 8080,
            slack_api_url: DEFAULT_SLACK_API_URL.to_string(),
            relay_timeout_ms: 10_000,
            await_dispatch: false,
        }
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or(ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Blank(name));
    }
    Ok(value)
}

fn parsed<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

/// A zero timeout would fail every dispatch, so it is refused at startup.
fn relay_timeout_ms<F>(lookup: &F) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed::<F, u64>(lookup, "RELAY_TIMEOUT_MS")? {
        None => Ok(10_000),
        Some(0) => Err(ConfigError::Invalid {
            name: "RELAY_TIMEOUT_MS",
            value: "0".to_string(),
        }),
        Some(ms) => Ok(ms),
    }
}

/// Parse a boolean flag; unrecognised values fall back to `false`.
fn parse_flag<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return false,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid flag value, using default");
            false
        }
    }
}
