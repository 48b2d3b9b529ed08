//! Error types for the homework clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the status API or Telegram
///
/// A transport failure carries no response, so there is nothing to inspect
/// beyond the underlying error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not complete (DNS, refused connection, timeout)
    #[error("ошибка запроса к API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The status API answered with something other than 200 OK
    #[error("неверный код ответа API: {status}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
    },

    /// Telegram rejected the request
    #[error("ошибка Telegram API (код {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error description returned by the API
        message: String,
    },

    /// The body was not valid JSON
    #[error("не удалось разобрать ответ API: {0}")]
    Decode(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if the server answered with an unexpected status code
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedStatus { .. } | Self::ApiError { .. }
        )
    }

    /// Status code of the response, when one arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status } | Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
