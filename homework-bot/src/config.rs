//! Bot configuration
//!
//! Credentials, endpoints and loop tuning, read from the environment.
//! Missing credentials are a startup failure, never a per-iteration one.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::scheduler::{CursorPolicy, RecordFailurePolicy};

/// Default status API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth token for the status API
    pub practicum_token: SecretString,

    /// Telegram bot token
    pub telegram_token: SecretString,

    /// Chat receiving every notification
    pub telegram_chat_id: String,

    /// Status API endpoint
    pub endpoint: String,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Time between two polls
    pub retry_period: Duration,

    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,

    /// How the next `from_date` is chosen
    pub cursor_policy: CursorPolicy,

    /// What a malformed homework entry does to the rest of its snapshot
    pub record_failures: RecordFailurePolicy,
}

impl Config {
    /// Creates a configuration with default tuning
    pub fn new(
        practicum_token: SecretString,
        telegram_token: SecretString,
        telegram_chat_id: String,
    ) -> Self {
        Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            retry_period: Duration::from_secs(600),
            request_timeout: Duration::from_secs(30),
            cursor_policy: CursorPolicy::default(),
            record_failures: RecordFailurePolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - PRACTICUM_TOKEN (required)
    /// - TELEGRAM_TOKEN (required)
    /// - TELEGRAM_CHAT_ID (required)
    /// - RETRY_PERIOD (optional, seconds, default: 600)
    /// - REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - PRACTICUM_ENDPOINT (optional)
    /// - TELEGRAM_API_URL (optional)
    /// - CURSOR_MODE (optional, "server" or "wall-clock", default: server)
    /// - RECORD_FAILURES (optional, "abort" or "skip", default: abort)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let missing: Vec<&str> = ["PRACTICUM_TOKEN", "TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"]
            .into_iter()
            .filter(|&key| lookup(key).is_none_or(|value| value.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let required = |key: &str| lookup(key).unwrap_or_default();
        let mut config = Self::new(
            SecretString::from(required("PRACTICUM_TOKEN")),
            SecretString::from(required("TELEGRAM_TOKEN")),
            required("TELEGRAM_CHAT_ID"),
        );

        if let Some(endpoint) = lookup("PRACTICUM_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Some(url) = lookup("TELEGRAM_API_URL") {
            config.telegram_api_url = url;
        }

        if let Some(secs) = lookup("RETRY_PERIOD") {
            config.retry_period = parse_secs("RETRY_PERIOD", &secs)?;
        }

        if let Some(secs) = lookup("REQUEST_TIMEOUT") {
            config.request_timeout = parse_secs("REQUEST_TIMEOUT", &secs)?;
        }

        if let Some(mode) = lookup("CURSOR_MODE") {
            config.cursor_policy = mode.parse()?;
        }

        if let Some(mode) = lookup("RECORD_FAILURES") {
            config.record_failures = mode.parse()?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.practicum_token.expose_secret().is_empty() {
            anyhow::bail!("practicum_token cannot be empty");
        }

        if self.telegram_token.expose_secret().is_empty() {
            anyhow::bail!("telegram_token cannot be empty");
        }

        if self.telegram_chat_id.is_empty() {
            anyhow::bail!("telegram_chat_id cannot be empty");
        }

        for (name, url) in [
            ("endpoint", &self.endpoint),
            ("telegram_api_url", &self.telegram_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.retry_period.is_zero() {
            anyhow::bail!("retry_period must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| anyhow::anyhow!("{} must be a number of seconds, got {:?}", key, value))
}
