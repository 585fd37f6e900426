//! Error types for the network layer.

use scout_core::ScoutError;
use thiserror::Error;

/// Errors produced while issuing outbound requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-retryable HTTP status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Still receiving HTTP 429 after every retry
    #[error("rate limited by {url} after {attempts} attempts")]
    RateLimited {
        /// Requested URL
        url: String,
        /// Attempts made
        attempts: u32,
    },

    /// Response body could not be decoded
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The surrounding operation was cancelled
    #[error("request cancelled")]
    Cancelled,

    /// URL could not be parsed
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl NetError {
    /// Whether a fresh attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited { .. })
    }
}

impl From<NetError> for ScoutError {
    fn from(err: NetError) -> Self {
        match err {
            NetError::Cancelled => ScoutError::Cancelled,
            NetError::Decoding(msg) => ScoutError::Decoding(msg),
            other => ScoutError::Network(other.to_string()),
        }
    }
}

/// Result type alias for network operations.
pub type Result<T> = std::result::Result<T, NetError>;
