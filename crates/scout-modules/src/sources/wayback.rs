//! Historical snapshots from the Wayback Machine CDX API.

use crate::module::{cache_key, ensure_supported, url_with_params, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde_json::Value;
use std::time::Duration;

/// Parse a CDX JSON body (`[[header...], [timestamp, original, statuscode], ...]`).
///
/// The header row is skipped and rows with fewer than three string fields are ignored.
pub fn parse_cdx(body: &[u8]) -> Result<Vec<Artifact>, ScoutError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<Value>> = serde_json::from_slice(body)
        .map_err(|e| ScoutError::Decoding(format!("wayback: {e}")))?;

    Ok(rows
        .iter()
        .skip(1)
        .filter_map(|row| match row.as_slice() {
            [Value::String(timestamp), Value::String(original), Value::String(status), ..] => Some(
                Artifact::new(timestamp.clone(), original.clone())
                    .with_context(format!("Status: {status}")),
            ),
            _ => None,
        })
        .collect())
}

/// Archived captures of the domain.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaybackModule;

impl WaybackModule {
    const TTL: Duration = Duration::from_secs(2 * 60 * 60);
}

#[async_trait]
impl OsintModule for WaybackModule {
    fn id(&self) -> &'static str {
        "domain.wayback"
    }

    fn name(&self) -> &'static str {
        "Wayback Archive"
    }

    fn description(&self) -> &'static str {
        "Snapshots recorded by the Wayback Machine"
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

        let url = url_with_params(
            "https://web.archive.org/cdx/search/cdx",
            &[
                ("url", entity.value()),
                ("output", "json"),
                ("fl", "timestamp,original,statuscode"),
                ("filter", "statuscode:200"),
                ("limit", "50"),
            ],
        )?;
        let response = ctx.get(&url).await?;
        let artifacts = parse_cdx(&response.body)?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if artifacts.is_empty() {
                "No snapshots found".to_string()
            } else {
                format!("Found {} snapshots", artifacts.len())
            },
        );
        result.artifacts = artifacts;
        result.add_link(format!("https://web.archive.org/web/*/{}", entity.value()));

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
