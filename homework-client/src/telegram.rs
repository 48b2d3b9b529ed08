//! Telegram Bot API

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Minimal Telegram Bot API client
///
/// Only `sendMessage` is implemented. The bot token is part of the request
/// path, so transport errors are stripped of their URL before being returned.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org")
    base_url: String,
    /// Bot token
    token: SecretString,
    /// HTTP client instance
    client: Client,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    /// Create a new Telegram client with the given request timeout
    pub fn new(base_url: impl Into<String>, token: SecretString, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(base_url, token, crate::http_client(timeout)?))
    }

    /// Create a new Telegram client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, token: SecretString, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Get the base URL of the Bot API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a text message to a chat
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.token.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.without_url()))?;

        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();
        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(ClientError::api_error(
                status.as_u16(),
                description.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            None if status.is_success() => {
                Err(ClientError::Decode(format!("unexpected response: {}", body)))
            }
            None => Err(ClientError::api_error(status.as_u16(), body)),
        }
    }
}
