//! DNS record resolution over DNS-over-HTTPS.

use crate::module::{cache_key, ensure_supported, url_with_params, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use futures::future::join_all;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// DNS record types the scanner asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Mail exchanger
    Mx,
    /// Text record
    Txt,
    /// Name server
    Ns,
    /// Canonical name
    Cname,
}

impl RecordType {
    /// Types resolved by the DNS module, in artifact order.
    pub const ALL: [RecordType; 6] = [
        Self::A,
        Self::Aaaa,
        Self::Mx,
        Self::Txt,
        Self::Ns,
        Self::Cname,
    ];

    /// Numeric RR type code.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
        }
    }

    /// Mnemonic.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Cname => "CNAME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Owner name, usually fully qualified with a trailing dot
    pub name: String,
    /// Numeric RR type
    #[serde(rename = "type")]
    pub record_type: u16,
    /// Presentation-format data
    pub data: String,
    /// Time to live in seconds
    #[serde(rename = "TTL", default)]
    pub ttl: Option<u32>,
}

/// Resolves one record type for one host.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Answers for `host` of type `record_type`; an empty list when none exist.
    async fn resolve(
        &self,
        host: &str,
        record_type: RecordType,
        ctx: &ModuleContext,
    ) -> Result<Vec<DnsRecord>, ScoutError>;
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsRecord>,
}

/// Google Public DNS JSON API.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleDnsResolver;

impl GoogleDnsResolver {
    const ENDPOINT: &'static str = "https://dns.google/resolve";
}

#[async_trait]
impl DnsResolver for GoogleDnsResolver {
    async fn resolve(
        &self,
        host: &str,
        record_type: RecordType,
        ctx: &ModuleContext,
    ) -> Result<Vec<DnsRecord>, ScoutError> {
        let code = record_type.code().to_string();
        let url = url_with_params(Self::ENDPOINT, &[("name", host), ("type", &code)])?;
        let response: DohResponse = ctx.get_json(&url).await?;
        if response.status != 0 {
            return Err(ScoutError::Network(format!(
                "DNS status {} for {record_type} {host}",
                response.status
            )));
        }
        Ok(response.answer)
    }
}

/// Resolve one type, degrading every failure except cancellation to no records.
///
/// The flag reports whether the lookup degraded.
pub(crate) async fn resolve_or_empty(
    resolver: &dyn DnsResolver,
    host: &str,
    record_type: RecordType,
    ctx: &ModuleContext,
) -> Result<(Vec<DnsRecord>, bool), ScoutError> {
    match resolver.resolve(host, record_type, ctx).await {
        Ok(records) => Ok((records, false)),
        Err(ScoutError::Cancelled) => Err(ScoutError::Cancelled),
        Err(e) => {
            tracing::warn!(host, record_type = %record_type, "DNS lookup degraded to empty: {e}");
            Ok((Vec::new(), true))
        }
    }
}

/// A/AAAA/MX/TXT/NS/CNAME records for a domain.
pub struct DnsRecordsModule {
    resolver: Arc<dyn DnsResolver>,
}

impl DnsRecordsModule {
    const TTL: Duration = Duration::from_secs(30 * 60);

    /// Module using Google Public DNS.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(GoogleDnsResolver))
    }

    /// Module using a custom resolver.
    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for DnsRecordsModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsintModule for DnsRecordsModule {
    fn id(&self) -> &'static str {
        "domain.dns"
    }

    fn name(&self) -> &'static str {
        "DNS Records"
    }

    fn description(&self) -> &'static str {
        "Resolve A/AAAA/MX/TXT/NS/CNAME records via public DNS-over-HTTPS"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Domain
    }

    fn supports(&self, entity: &Entity) -> bool {
        entity.kind() == EntityKind::Domain
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        ensure_supported(self, entity)?;
        let key = cache_key(self.id(), entity);
        if let Some(hit) = ctx.cached(&key, Self::TTL).await {
            return Ok(hit);
        }

        let domain = entity.value();
        let lookups = RecordType::ALL.iter().map(|&record_type| async move {
            let outcome = resolve_or_empty(self.resolver.as_ref(), domain, record_type, ctx).await;
            (record_type, outcome)
        });

        let mut result = ModuleResult::new(self.id(), self.name(), entity);
        let mut degraded = Vec::new();
        for (record_type, outcome) in join_all(lookups).await {
            let (records, failed) = outcome?;
            if failed {
                degraded.push(record_type.as_str());
            }
            for record in records {
                result.push(
                    Artifact::new(format!("{record_type} {}", record.name), record.data)
                        .with_context(format!("TTL: {}", record.ttl.unwrap_or(0))),
                );
            }
        }

        result.summary = if result.artifacts.is_empty() {
            "No DNS records found".to_string()
        } else {
            format!("Found {} DNS records", result.artifacts.len())
        };
        result.add_link(format!("https://dns.google/query?name={domain}"));

        if degraded.is_empty() {
            ctx.remember(&key, &result).await;
        } else {
            result.insert_raw("degraded_types", serde_json::json!(degraded));
        }
        Ok(result)
    }
}
