//! Keyword search against the NVD CVE API.

use crate::module::{cache_key, ensure_supported, url_with_params, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use serde::Deserialize;
use std::time::Duration;

const MAX_CVES: usize = 10;
const MAX_LINKS: usize = 5;

#[derive(Debug, Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Deserialize)]
struct NvdVulnerability {
    cve: CveItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CveItem {
    id: String,
    #[serde(default)]
    descriptions: Vec<CveDescription>,
    #[serde(default)]
    metrics: Option<CveMetrics>,
}

#[derive(Debug, Deserialize)]
struct CveDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CveMetrics {
    #[serde(default)]
    cvss_metric_v31: Vec<CvssMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CvssMetric {
    cvss_data: CvssData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CvssData {
    base_score: Option<f64>,
    base_severity: Option<String>,
}

/// A CVE matched by a keyword search.
#[derive(Debug, Clone, PartialEq)]
pub struct CveMatch {
    /// CVE identifier
    pub id: String,
    /// English description, empty when absent
    pub description: String,
    /// CVSS v3.1 base score
    pub score: Option<f64>,
    /// CVSS v3.1 severity
    pub severity: Option<String>,
}

impl CveMatch {
    fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = vec![Artifact::new("CVE", self.id.clone()).with_context(self.description.clone())];
        if let Some(score) = self.score {
            let cvss = Artifact::new("CVSS", format!("{score:.1}"));
            artifacts.push(match &self.severity {
                Some(severity) => cvss.with_context(severity.clone()),
                None => cvss,
            });
        }
        artifacts
    }
}

/// Decode an NVD 2.0 response into matches, in response order.
pub fn parse_nvd(body: &[u8]) -> Result<Vec<CveMatch>, ScoutError> {
    let response: NvdResponse =
        serde_json::from_slice(body).map_err(|e| ScoutError::Decoding(format!("nvd: {e}")))?;

    Ok(response
        .vulnerabilities
        .into_iter()
        .map(|vuln| {
            let cve = vuln.cve;
            let description = cve
                .descriptions
                .iter()
                .find(|d| d.lang == "en")
                .map(|d| d.value.clone())
                .unwrap_or_default();
            let cvss = cve
                .metrics
                .and_then(|m| m.cvss_metric_v31.into_iter().next())
                .map(|m| m.cvss_data);
            CveMatch {
                id: cve.id,
                description,
                score: cvss.as_ref().and_then(|c| c.base_score),
                severity: cvss.and_then(|c| c.base_severity),
            }
        })
        .collect())
}

/// CVEs whose text mentions the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct NvdModule;

impl NvdModule {
    const TTL: Duration = Duration::from_secs(2 * 60 * 60);
    const ENDPOINT: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
}

#[async_trait]
impl OsintModule for NvdModule {
    fn id(&self) -> &'static str {
        "vuln.nvd"
    }

    fn name(&self) -> &'static str {
        "NVD CVE Search"
    }

    fn description(&self) -> &'static str {
        "Keyword search in the National Vulnerability Database"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Vulnerability
    }

    fn supports(&self, entity: &Entity) -> bool {
        matches!(entity.kind(), EntityKind::Ip | EntityKind::Email)
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        ensure_supported(self, entity)?;
        let key = cache_key(self.id(), entity);
        if let Some(hit) = ctx.cached(&key, Self::TTL).await {
            return Ok(hit);
        }

        let url = url_with_params(Self::ENDPOINT, &[("keywordSearch", entity.value())])?;
        let response = ctx.get(&url).await?;
        let matches = parse_nvd(&response.body)?;
        let shown = &matches[..matches.len().min(MAX_CVES)];

        let mut result = ModuleResult::new(self.id(), self.name(), entity).with_summary(
            if shown.is_empty() {
                "No NVD matches found".to_string()
            } else {
                format!("Found {} NVD entries", shown.len())
            },
        );
        for cve in shown {
            result.artifacts.extend(cve.artifacts());
        }
        for cve in matches.iter().take(MAX_LINKS) {
            result.add_link(format!("https://nvd.nist.gov/vuln/detail/{}", cve.id));
        }
        result.insert_raw("total_matches", serde_json::json!(matches.len()));

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
