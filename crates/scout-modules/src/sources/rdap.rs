//! Domain registration data via RDAP.

use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapDomain {
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    nameservers: Vec<RdapNameserver>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    event_action: Option<String>,
    event_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapNameserver {
    ldh_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    vcard_array: Option<Value>,
}

impl RdapEntity {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Formatted name (`fn`) from a jCard: `["vcard", [["fn", {}, "text", "Name"], ...]]`.
    fn formatted_name(&self) -> Option<String> {
        let properties = self.vcard_array.as_ref()?.as_array()?.get(1)?.as_array()?;
        properties.iter().find_map(|property| {
            let fields = property.as_array()?;
            if fields.first()?.as_str()? != "fn" {
                return None;
            }
            let name = fields.get(3)?.as_str()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    }
}

/// Turn an RDAP domain object into artifacts: lifecycle events, name
/// servers, registrar and (sensitive) registrant.
pub fn parse_rdap(body: &[u8]) -> Result<(Vec<Artifact>, Option<String>), ScoutError> {
    let domain: RdapDomain =
        serde_json::from_slice(body).map_err(|e| ScoutError::Decoding(format!("rdap: {e}")))?;

    let mut artifacts: Vec<Artifact> = domain
        .events
        .iter()
        .filter_map(|event| match (&event.event_action, &event.event_date) {
            (Some(action), Some(date)) => Some(Artifact::new(action.clone(), date.clone())),
            _ => None,
        })
        .collect();

    artifacts.extend(
        domain
            .nameservers
            .iter()
            .filter_map(|ns| ns.ldh_name.as_deref())
            .map(|name| Artifact::new("NS", name.to_lowercase())),
    );

    for entity in &domain.entities {
        let Some(name) = entity.formatted_name() else {
            continue;
        };
        if entity.has_role("registrar") {
            artifacts.push(Artifact::new("Registrar", name));
        } else if entity.has_role("registrant") {
            artifacts.push(Artifact::new("Registrant", name).sensitive());
        }
    }

    Ok((artifacts, domain.handle))
}

/// Registration events, name servers and registrar for a domain.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdapModule;

impl RdapModule {
    const TTL: Duration = Duration::from_secs(2 * 60 * 60);
}

#[async_trait]
impl OsintModule for RdapModule {
    fn id(&self) -> &'static str {
        "domain.rdap"
    }

    fn name(&self) -> &'static str {
        "RDAP"
    }

    fn description(&self) -> &'static str {
        "Domain registration data"
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

        let url = format!("https://rdap.org/domain/{}", entity.value());
        let response = ctx.get(&url).await?;
        let (artifacts, handle) = parse_rdap(&response.body)?;

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if artifacts.is_empty() {
                "RDAP data is limited".to_string()
            } else {
                format!("Retrieved {} registration records", artifacts.len())
            },
        );
        result.artifacts = artifacts;
        if let Some(handle) = handle {
            result.insert_raw("handle", Value::String(handle));
        }
        result.add_link(url);

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
