//! Homework status API

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

/// HTTP client for the homework status API
///
/// Performs one `GET` per poll with `Authorization: OAuth <token>` and a
/// `from_date` cursor. The decoded body is returned as-is; checking its shape
/// is left to the caller. Transport errors carry no URL, so the same outage
/// reads the same whatever cursor was requested.
#[derive(Debug, Clone)]
pub struct StatusClient {
    /// Full endpoint URL
    endpoint: String,
    /// OAuth token of the tracked user
    token: SecretString,
    /// HTTP client instance
    client: Client,
}

impl StatusClient {
    /// Create a new status client with the given request timeout
    pub fn new(
        endpoint: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self::with_client(endpoint, token, crate::http_client(timeout)?))
    }

    /// Create a new status client with a custom HTTP client
    pub fn with_client(endpoint: impl Into<String>, token: SecretString, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            client,
        }
    }

    /// Fetch the status snapshot for homeworks updated since `from_date`
    ///
    /// # Errors
    /// - [`ClientError::Transport`] when no response arrived
    /// - [`ClientError::UnexpectedStatus`] when the status is not 200
    /// - [`ClientError::Decode`] when the body is not JSON
    pub async fn fetch(&self, from_date: i64) -> Result<JsonValue> {
        debug!("Requesting homework statuses from_date={}", from_date);

        let response = self
            .client
            .get(&self.endpoint)
            .header(
                AUTHORIZATION,
                format!("OAuth {}", self.token.expose_secret()),
            )
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.without_url()))?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
