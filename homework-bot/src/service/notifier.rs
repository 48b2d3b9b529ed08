//! Notifier service
//!
//! Delivers text messages to the configured chat. Delivery is best effort:
//! failures are logged and never reach the polling loop.

use async_trait::async_trait;
use homework_client::{ClientError, TelegramClient};
use tracing::{debug, error, info};

/// Service trait for message delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to the fixed destination
    async fn send(&self, text: &str) -> Result<(), ClientError>;
}

/// Telegram implementation of Notifier
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier posting to `chat_id`
    pub fn new(client: TelegramClient, chat_id: String) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), ClientError> {
        self.client.send_message(&self.chat_id, text).await
    }
}

/// Sends `text`, logging instead of propagating failures
///
/// Returns whether the message was delivered.
pub async fn deliver(notifier: &dyn Notifier, text: &str) -> bool {
    info!("Sending notification");
    match notifier.send(text).await {
        Ok(()) => {
            debug!("Notification sent: {}", text);
            true
        }
        Err(e) => {
            error!("Failed to send notification: {}", e);
            false
        }
    }
}
