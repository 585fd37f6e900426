//! Scout Modules - the pluggable data sources behind an OSINT Scout scan.
//!
//! Every source implements [`OsintModule`]: it declares which entity kinds it
//! supports and turns one [`Entity`](scout_core::Entity) into one
//! [`ModuleResult`](scout_core::ModuleResult). Modules reach the network only
//! through the shared [`ModuleContext`], which carries the rate-limited
//! fetcher, the response cache and the scan's cancellation token.
//!
//! [`ModuleRegistry::with_defaults`] lists the built-in sources:
//!
//! | id                    | entity   | source                         |
//! |-----------------------|----------|--------------------------------|
//! | `domain.dns`          | domain   | Google DNS-over-HTTPS          |
//! | `domain.crtsh`        | domain   | crt.sh certificate logs        |
//! | `domain.wayback`      | domain   | Wayback Machine CDX            |
//! | `domain.rdap`         | domain   | rdap.org                       |
//! | `domain.http_headers` | domain   | HEAD probe                     |
//! | `domain.robots`       | domain   | robots.txt                     |
//! | `ip.geo`              | ip       | ip-api.com                     |
//! | `email.policy`        | email    | SPF/DKIM/DMARC TXT records     |
//! | `username.presence`   | username | profile URL probes             |
//! | `vuln.nvd`            | ip/email | NVD CVE keyword search         |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod module;
pub mod registry;
pub mod sources;

// Re-export commonly used types
pub use module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
pub use registry::ModuleRegistry;
pub use sources::{DnsRecord, DnsResolver, RecordType, UsernameSite};
