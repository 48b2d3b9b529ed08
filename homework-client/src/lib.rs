//! Homework HTTP Clients
//!
//! Type-safe HTTP clients used by the homework bot:
//! - [`StatusClient`] fetches homework status snapshots from the status API
//! - [`TelegramClient`] delivers text messages through the Telegram Bot API
//!
//! # Example
//!
//! ```no_run
//! use homework_client::StatusClient;
//! use secrecy::SecretString;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = StatusClient::new(
//!         "https://practicum.yandex.ru/api/user_api/homework_statuses/",
//!         SecretString::from("token".to_string()),
//!         Duration::from_secs(30),
//!     )?;
//!
//!     let body = client.fetch(0).await?;
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```

pub mod error;
mod statuses;
mod telegram;

pub use error::{ClientError, Result};
pub use statuses::StatusClient;
pub use telegram::TelegramClient;

use reqwest::Client;
use std::time::Duration;

/// Builds a reqwest client with an explicit request timeout
///
/// Both clients go through here so no request can hang on the transport's
/// unbounded default.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(client)
}
