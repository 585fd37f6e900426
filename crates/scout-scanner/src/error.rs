//! Scan and export error types.

use scout_core::{EntityKind, ValidationError};
use thiserror::Error;

/// Reasons a scan ends without a result set.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No registered module supports the target
    #[error("no applicable modules for {kind} target {target}")]
    NoApplicableModules {
        /// Kind of the rejected target
        kind: EntityKind,
        /// Normalised target value
        target: String,
    },

    /// The ethics gate rejected the target
    #[error("blocked by ethics policy: {0}")]
    BlockedByPolicy(String),

    /// The raw input is not a valid target
    #[error("invalid target: {0}")]
    Validation(#[from] ValidationError),

    /// The scan was cancelled before every module settled
    #[error("scan cancelled")]
    Cancelled,

    /// Another scan is still running on this scanner
    #[error("a scan is already running")]
    AlreadyRunning,
}

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The report could not be serialised
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The output file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
