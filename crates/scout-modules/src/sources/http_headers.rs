//! Response headers of the domain's web server.

use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use scout_net::{HttpRequest, HttpResponse};
use std::time::Duration;

const MAX_HEADERS: usize = 10;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `content-type` -> `Content-Type`.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// HEAD probe over HTTPS, falling back to plain HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpHeadersModule;

impl HttpHeadersModule {
    const TTL: Duration = Duration::from_secs(30 * 60);

    async fn probe(domain: &str, ctx: &ModuleContext) -> Result<HttpResponse, ScoutError> {
        let mut last_error = None;
        for scheme in ["https", "http"] {
            let request = HttpRequest::head(format!("{scheme}://{domain}")).with_timeout(PROBE_TIMEOUT);
            match ctx.fetch(&request).await {
                Ok(response) => return Ok(response),
                Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
                Err(e) => {
                    tracing::debug!(url = %request.url, "Header probe failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(ScoutError::Network(format!(
            "could not retrieve headers from {domain}: {}",
            last_error.map_or_else(|| "no scheme attempted".to_string(), |e| e.to_string())
        )))
    }
}

#[async_trait]
impl OsintModule for HttpHeadersModule {
    fn id(&self) -> &'static str {
        "domain.http_headers"
    }

    fn name(&self) -> &'static str {
        "HTTP Headers"
    }

    fn description(&self) -> &'static str {
        "HEAD request against the web server"
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

        let response = Self::probe(entity.value(), ctx).await?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity);
        // Headers are keyed by name, so the ten kept are the first ten alphabetically.
        for (name, value) in response.headers.iter().take(MAX_HEADERS) {
            result.push(Artifact::new(canonical_header_name(name), value.clone()));
        }
        result.summary = format!(
            "Status {}. Headers: {}",
            response.status,
            result.artifacts.len()
        );
        result.insert_raw("status", serde_json::json!(response.status));
        if !response.url.is_empty() {
            result.add_link(response.url.clone());
        }

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
