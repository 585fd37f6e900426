//! Scout Cache - durable response cache for OSINT Scout modules.
//!
//! A single SQLite table of `(key, value, timestamp)` rows. The cache has no
//! TTL policy of its own: every read passes the maximum age the caller is
//! willing to accept, and stale rows are simply overwritten by the next write.
//!
//! # Example
//!
//! ```rust,no_run
//! use scout_cache::Cache;
//! use std::time::Duration;
//!
//! # async fn example() -> scout_cache::Result<()> {
//! let cache = Cache::in_memory().await?;
//! cache.store("domain.dns|example.com", b"payload").await?;
//! let hit = cache.fetch("domain.dns|example.com", Duration::from_secs(1800)).await?;
//! assert!(hit.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cache;
pub mod error;
pub mod migrations;

// Re-export commonly used types
pub use cache::Cache;
pub use error::{CacheError, Result};
