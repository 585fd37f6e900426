//! Core error types for OSINT Scout.
//!
//! [`ScoutError`] is the taxonomy every module reports through. Subsystem
//! crates keep their own error enums and convert into it at their boundary.

use thiserror::Error;

/// Central error type for all Scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Transport or HTTP status failure after retries were exhausted
    #[error("network error: {0}")]
    Network(String),

    /// Upstream payload could not be decoded
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Cache storage failure (callers degrade to a cache miss)
    #[error("cache error: {0}")]
    Cache(String),

    /// Entity input rejected before any network I/O
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Target rejected by the ethics gate
    #[error("blocked by ethics policy: {0}")]
    BlockedByPolicy(String),

    /// Operation cancelled by the user
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScoutError {
    /// Whether this error is a user-initiated cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Entity validation failures, one variant per violated rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input was empty after trimming
    #[error("input is empty")]
    Empty,

    /// Domain did not match `<labels>.<tld>` with an alphabetic TLD of two or more letters
    #[error("invalid domain '{0}': expected labels of [A-Za-z0-9.-] followed by an alphabetic TLD of at least 2 letters")]
    InvalidDomain(String),

    /// Not an IPv4 or IPv6 literal
    #[error("invalid IP address '{0}': expected an IPv4 or IPv6 literal")]
    InvalidIp(String),

    /// Not shaped like `local@domain.tld`
    #[error("invalid email '{0}': expected local-part@domain.tld")]
    InvalidEmail(String),

    /// Username outside the allowed charset or length
    #[error("invalid username '{0}': expected 3-32 characters of [A-Za-z0-9_.-]")]
    InvalidUsername(String),

    /// Unknown entity kind name
    #[error("unknown entity kind '{0}': expected domain, ip, email or username")]
    UnknownKind(String),

    /// Entity handed to a module that does not support its kind
    #[error("module {module} does not support {kind} targets")]
    UnsupportedKind {
        /// Module identifier
        module: String,
        /// Entity kind name
        kind: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `ScoutError`.
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
