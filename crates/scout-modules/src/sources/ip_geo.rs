//! IP geolocation via ip-api.com.

use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(rename = "as", default)]
    asn: Option<String>,
}

/// Country, region, city, ISP, organisation and ASN for an address.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpGeoModule;

impl IpGeoModule {
    const TTL: Duration = Duration::from_secs(60 * 60);
}

fn artifacts_from(response: IpApiResponse) -> Result<Vec<Artifact>, ScoutError> {
    if !response.status.eq_ignore_ascii_case("success") {
        return Err(ScoutError::Network(format!(
            "ip-api.com lookup failed: {}",
            response.message.as_deref().unwrap_or("unknown reason")
        )));
    }

    let fields = [
        ("Country", response.country, false),
        ("Region", response.region_name, false),
        ("City", response.city, true),
        ("ISP", response.isp, false),
        ("Organization", response.org, false),
        ("ASN", response.asn, false),
    ];

    Ok(fields
        .into_iter()
        .filter_map(|(title, value, sensitive)| {
            let value = value.filter(|v| !v.trim().is_empty())?;
            let artifact = Artifact::new(title, value);
            Some(if sensitive { artifact.sensitive() } else { artifact })
        })
        .collect())
}

#[async_trait]
impl OsintModule for IpGeoModule {
    fn id(&self) -> &'static str {
        "ip.geo"
    }

    fn name(&self) -> &'static str {
        "IP Geolocation"
    }

    fn description(&self) -> &'static str {
        "Location and network owner from ip-api.com"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Ip
    }

    fn supports(&self, entity: &Entity) -> bool {
        entity.kind() == EntityKind::Ip
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        ensure_supported(self, entity)?;
        let key = cache_key(self.id(), entity);
        if let Some(hit) = ctx.cached(&key, Self::TTL).await {
            return Ok(hit);
        }

        let url = format!("http://ip-api.com/json/{}", entity.value());
        let response: IpApiResponse = ctx.get_json(&url).await?;
        let artifacts = artifacts_from(response)?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if artifacts.is_empty() {
                "No ip-api.com data available".to_string()
            } else {
                format!("Retrieved {} IP metadata fields", artifacts.len())
            },
        );
        result.artifacts = artifacts;
        result.add_link(format!("https://ip-api.com/#{}", entity.value()));

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
