//! Scout Core - Foundation crate for the OSINT Scout reconnaissance engine.
//!
//! This crate provides the value types every other Scout crate exchanges:
//! validated scan targets, module results, the shared error taxonomy and
//! the configuration/settings layer.
//!
//! # Modules
//!
//! - [`entity`] - Validated scan targets (domain, IP, email, username)
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and a live settings store
//! - [`types`] - `Artifact`, `ModuleResult` and `Timestamp`
//! - [`policy`] - Ethics gate rejecting sensitive-looking targets
//!
//! # Example
//!
//! ```rust
//! use scout_core::{Entity, EntityKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let entity = Entity::parse("Example.COM", EntityKind::Domain)?;
//! assert_eq!(entity.value(), "example.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod entity;
pub mod error;
pub mod policy;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, CacheConfig, EthicsConfig, NetworkConfig, SettingsStore, SourcesConfig,
};
pub use entity::{Entity, EntityKind};
pub use error::{ConfigError, ConfigResult, Result, ScoutError, ValidationError};
pub use policy::EthicsPolicy;
pub use types::{Artifact, ModuleResult, Timestamp};
