//! Data-source module implementations.

pub mod crtsh;
pub mod dns;
pub mod email_policy;
pub mod http_headers;
pub mod ip_geo;
pub mod nvd;
pub mod rdap;
pub mod robots;
pub mod username;
pub mod wayback;

pub use crtsh::CrtShModule;
pub use dns::{DnsRecord, DnsRecordsModule, DnsResolver, GoogleDnsResolver, RecordType};
pub use email_policy::EmailPolicyModule;
pub use http_headers::HttpHeadersModule;
pub use ip_geo::IpGeoModule;
pub use nvd::NvdModule;
pub use rdap::RdapModule;
pub use robots::RobotsModule;
pub use username::{default_sites, UsernamePresenceModule, UsernameSite};
pub use wayback::WaybackModule;
