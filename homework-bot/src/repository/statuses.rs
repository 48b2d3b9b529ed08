//! Status repository
//!
//! Fetches raw homework status snapshots.

use async_trait::async_trait;
use homework_client::{ClientError, StatusClient};
use serde_json::Value as JsonValue;

/// Repository trait for homework status snapshots
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Fetches the decoded status body for changes since `from_date`
    ///
    /// The body is not validated here.
    async fn fetch_statuses(&self, from_date: i64) -> Result<JsonValue, ClientError>;
}

/// HTTP implementation of StatusRepository
pub struct HttpStatusRepository {
    client: StatusClient,
}

impl HttpStatusRepository {
    /// Creates a new HTTP status repository
    pub fn new(client: StatusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRepository for HttpStatusRepository {
    async fn fetch_statuses(&self, from_date: i64) -> Result<JsonValue, ClientError> {
        self.client.fetch(from_date).await
    }
}
