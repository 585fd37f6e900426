//! robots.txt rule extraction.

use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use std::time::Duration;

const MAX_RULES: usize = 20;

/// Extract `User-agent`, `Allow`, `Disallow` and `Sitemap` directives.
///
/// Comments are stripped, other directives are ignored and at most 20 rules
/// are returned.
#[must_use]
pub fn parse_robots(text: &str) -> Vec<Artifact> {
    text.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            let (key, value) = line.split_once(':')?;
            let title = match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => "User-agent",
                "allow" => "Allow",
                "disallow" => "Disallow",
                "sitemap" => "Sitemap",
                _ => return None,
            };
            Some(Artifact::new(title, value.trim()))
        })
        .take(MAX_RULES)
        .collect()
}

/// Crawl rules published by the site.
#[derive(Debug, Default, Clone, Copy)]
pub struct RobotsModule;

impl RobotsModule {
    const TTL: Duration = Duration::from_secs(30 * 60);

    /// First non-empty UTF-8 robots.txt over HTTPS, then HTTP.
    async fn download(domain: &str, ctx: &ModuleContext) -> Result<(String, String), ScoutError> {
        for scheme in ["https", "http"] {
            let url = format!("{scheme}://{domain}/robots.txt");
            match ctx.get(&url).await {
                Ok(response) => match response.text() {
                    Some(text) if !text.trim().is_empty() => return Ok((text.to_string(), url)),
                    _ => tracing::debug!(url = %url, "robots.txt empty or not UTF-8"),
                },
                Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
                Err(e) => tracing::debug!(url = %url, "robots.txt fetch failed: {e}"),
            }
        }
        Err(ScoutError::Network(format!("robots.txt unavailable for {domain}")))
    }
}

#[async_trait]
impl OsintModule for RobotsModule {
    fn id(&self) -> &'static str {
        "domain.robots"
    }

    fn name(&self) -> &'static str {
        "robots.txt"
    }

    fn description(&self) -> &'static str {
        "Crawl directives from robots.txt"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Web
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

        let (text, url) = Self::download(entity.value(), ctx).await?;
        let artifacts = parse_robots(&text);

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if artifacts.is_empty() {
                "robots.txt contains no rules".to_string()
            } else {
                format!("Found {} rules", artifacts.len())
            },
        );
        result.artifacts = artifacts;
        result.add_link(url);

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
