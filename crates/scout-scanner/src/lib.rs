//! Scout Scanner - scan orchestration for OSINT Scout.
//!
//! The [`Scanner`] fans one target out to every applicable module of a
//! [`ModuleRegistry`](scout_modules::ModuleRegistry), tolerates individual
//! module failures, publishes progress and supports cancellation. Finished
//! results are aggregated into a [`Report`] and rendered by [`export`].
//!
//! # Example
//!
//! ```rust,no_run
//! use scout_cache::Cache;
//! use scout_core::{AppConfig, SettingsStore};
//! use scout_modules::ModuleRegistry;
//! use scout_net::Fetcher;
//! use scout_scanner::{Report, Scanner};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsStore::new(AppConfig::default());
//! let scanner = Scanner::new(
//!     Arc::new(ModuleRegistry::with_defaults()),
//!     Arc::new(Fetcher::new(settings.clone())?),
//!     Arc::new(Cache::in_memory().await?),
//!     settings,
//! );
//!
//! let outcome = scanner.scan_input("example.com", None).await?;
//! let mut report = Report::new(outcome.entity.value());
//! report.ingest(outcome.entity.value(), &outcome.results);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod export;
pub mod report;
pub mod scanner;

// Re-export commonly used types
pub use error::{ExportError, Result, ScanError};
pub use export::{ExportFormat, ExportOptions};
pub use report::{Report, ReportSection};
pub use scanner::{FailureReason, ScanOutcome, ScanState, Scanner};
