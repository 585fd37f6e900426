//! Cache error types.

use scout_core::ScoutError;
use thiserror::Error;

/// Cache-specific errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to open or create the cache database.
    #[error("failed to open cache: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Cached payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error preparing the cache location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CacheError> for ScoutError {
    fn from(err: CacheError) -> Self {
        ScoutError::Cache(err.to_string())
    }
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
