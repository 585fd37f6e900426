//! Scout Net - outbound HTTP plumbing shared by every OSINT Scout module.
//!
//! All requests go through one [`Fetcher`], which paces them with a shared
//! [`RateLimiter`], retries transient failures and HTTP 429 with exponential
//! backoff, and aborts promptly when the scan's cancellation token fires.
//!
//! The actual HTTP stack sits behind the [`Transport`] trait; production code
//! uses [`ReqwestTransport`] while tests script responses in-process.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod fetcher;
pub mod limiter;
pub mod transport;

// Re-export commonly used types
pub use error::{NetError, Result};
pub use fetcher::{backoff_delay, Fetcher};
pub use limiter::{RateLimiter, RatePermit};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
