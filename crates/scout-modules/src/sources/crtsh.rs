//! Subdomain discovery from certificate-transparency logs (crt.sh).

use crate::module::{cache_key, ensure_supported, url_with_params, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const MAX_CERTIFICATES: usize = 20;

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    #[serde(default)]
    common_name: Option<String>,
    #[serde(default)]
    name_value: String,
}

/// Extract unique subdomain artifacts from a crt.sh JSON body.
///
/// An empty body means no certificates were found.
pub fn parse_crtsh(body: &[u8]) -> Result<Vec<Artifact>, ScoutError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let entries: Vec<CrtShEntry> = serde_json::from_slice(body)
        .map_err(|e| ScoutError::Decoding(format!("crt.sh: {e}")))?;

    let mut seen = HashSet::new();
    let mut artifacts = Vec::new();
    for entry in entries.iter().take(MAX_CERTIFICATES) {
        let common_name = entry.common_name.as_deref().unwrap_or("unknown");
        for name in entry.name_value.lines().map(str::trim).filter(|n| !n.is_empty()) {
            let name = name.to_lowercase();
            if seen.insert(name.clone()) {
                artifacts.push(
                    Artifact::new("Subdomain", name).with_context(format!("Certificate: {common_name}")),
                );
            }
        }
    }
    Ok(artifacts)
}

/// Subdomains named in publicly logged certificates.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrtShModule;

impl CrtShModule {
    const TTL: Duration = Duration::from_secs(60 * 60);
}

#[async_trait]
impl OsintModule for CrtShModule {
    fn id(&self) -> &'static str {
        "domain.crtsh"
    }

    fn name(&self) -> &'static str {
        "crt.sh Subdomains"
    }

    fn description(&self) -> &'static str {
        "Extract subdomains from certificate-transparency logs"
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

        let query = format!("%.{}", entity.value());
        let url = url_with_params("https://crt.sh/", &[("q", &query), ("output", "json")])?;
        let response = ctx.get(&url).await?;
        let artifacts = parse_crtsh(&response.body)?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if artifacts.is_empty() {
                "No subdomains found".to_string()
            } else {
                format!("Found {} potential subdomains", artifacts.len())
            },
        );
        result.artifacts = artifacts;
        result.add_link(format!("https://crt.sh/?q={}", entity.value()));

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_and_deduplicates() {
        let body = br#"[
            {"common_name": "example.com", "name_value": "example.com\nwww.example.com"},
            {"common_name": "mail.example.com", "name_value": "MAIL.example.com\nwww.example.com\n"}
        ]"#;
        let artifacts = parse_crtsh(body).expect("parse");
        let values: Vec<&str> = artifacts.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["example.com", "www.example.com", "mail.example.com"]);
        assert_eq!(
            artifacts[2].context.as_deref(),
            Some("Certificate: mail.example.com")
        );
    }

    #[test]
    fn test_parse_limits_certificates() {
        let entries: Vec<String> = (0..30)
            .map(|i| format!(r#"{{"common_name": "c{i}", "name_value": "host{i}.example.com"}}"#))
            .collect();
        let body = format!("[{}]", entries.join(","));
        assert_eq!(parse_crtsh(body.as_bytes()).expect("parse").len(), 20);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse_crtsh(b"").expect("empty body").is_empty());
        assert!(matches!(
            parse_crtsh(b"<html>busy</html>"),
            Err(ScoutError::Decoding(_))
        ));
    }
}
