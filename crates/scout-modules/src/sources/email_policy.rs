//! SPF, DMARC and DKIM policies for an address's mail domain.

use super::dns::{resolve_or_empty, DnsRecord, DnsResolver, GoogleDnsResolver, RecordType};
use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use std::sync::Arc;
use std::time::Duration;

/// TXT data without the surrounding quotes DoH resolvers keep.
fn unquote(record: &DnsRecord) -> String {
    record
        .data
        .split('"')
        .filter(|chunk| !chunk.trim().is_empty())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

fn starts_with_tag(text: &str, tag: &str) -> bool {
    text.get(..tag.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(tag))
}

/// Keep TXT strings carrying `tag` (all strings when `tag` is `None`) and
/// join them into one artifact value.
fn policy_value(records: &[DnsRecord], tag: Option<&str>) -> Option<String> {
    let values: Vec<String> = records
        .iter()
        .map(unquote)
        .filter(|text| tag.map_or(!text.is_empty(), |tag| starts_with_tag(text, tag)))
        .collect();
    (!values.is_empty()).then(|| values.join("; "))
}

/// Mail-authentication policies published by the domain of an email address.
pub struct EmailPolicyModule {
    resolver: Arc<dyn DnsResolver>,
}

impl EmailPolicyModule {
    const TTL: Duration = Duration::from_secs(60 * 60);

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

impl Default for EmailPolicyModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsintModule for EmailPolicyModule {
    fn id(&self) -> &'static str {
        "email.policy"
    }

    fn name(&self) -> &'static str {
        "Mail Policies"
    }

    fn description(&self) -> &'static str {
        "SPF, DKIM and DMARC records of the mail domain"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Email
    }

    fn supports(&self, entity: &Entity) -> bool {
        entity.kind() == EntityKind::Email
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        ensure_supported(self, entity)?;
        let key = cache_key(self.id(), entity);
        if let Some(hit) = ctx.cached(&key, Self::TTL).await {
            return Ok(hit);
        }

        let domain = entity.email_domain().unwrap_or_else(|| entity.value());
        let dmarc_host = format!("_dmarc.{domain}");
        let dkim_host = format!("default._domainkey.{domain}");
        let resolver = self.resolver.as_ref();

        let (spf, dmarc, dkim) = tokio::join!(
            resolve_or_empty(resolver, domain, RecordType::Txt, ctx),
            resolve_or_empty(resolver, &dmarc_host, RecordType::Txt, ctx),
            resolve_or_empty(resolver, &dkim_host, RecordType::Txt, ctx),
        );
        let (spf, spf_degraded) = spf?;
        let (dmarc, dmarc_degraded) = dmarc?;
        let (dkim, dkim_degraded) = dkim?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity);
        let policies = [
            ("SPF", policy_value(&spf, Some("v=spf1"))),
            ("DMARC", policy_value(&dmarc, Some("v=DMARC1"))),
            ("DKIM", policy_value(&dkim, None)),
        ];
        let mut found = Vec::new();
        for (title, value) in policies {
            if let Some(value) = value {
                result.push(Artifact::new(title, value));
                found.push(title);
            }
        }

        result.summary = if found.is_empty() {
            "No SPF/DKIM/DMARC policies found".to_string()
        } else {
            format!("Found mail policies: {}", found.join(", "))
        };
        result.add_link(format!("https://dns.google/query?name={domain}&type=TXT"));

        if spf_degraded || dmarc_degraded || dkim_degraded {
            result.insert_raw("degraded", serde_json::Value::Bool(true));
        } else {
            ctx.remember(&key, &result).await;
        }
        Ok(result)
    }
}
