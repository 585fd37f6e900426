//! Aggregation of module results into a per-target report.

use scout_core::{Artifact, ModuleResult, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One module's contribution to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Id of the module that produced the section
    pub module_id: String,
    /// Section heading (the module name)
    pub title: String,
    /// Module summary
    pub summary: String,
    /// Extracted facts
    pub artifacts: Vec<Artifact>,
    /// Source URLs
    pub links: Vec<String>,
    /// Attribution line
    pub source: String,
    /// Markdown anchor derived from the title
    pub anchor: String,
}

impl ReportSection {
    /// Section for `result`.
    #[must_use]
    pub fn from_result(result: &ModuleResult) -> Self {
        Self {
            module_id: result.module_id.clone(),
            title: result.module_name.clone(),
            summary: result.summary.clone(),
            artifacts: result.artifacts.clone(),
            links: result.source_links.clone(),
            source: result.module_name.clone(),
            anchor: anchor_for(&result.module_name),
        }
    }

    /// Artifacts to show, dropping sensitive ones unless `include_sensitive`.
    pub fn visible_artifacts(&self, include_sensitive: bool) -> impl Iterator<Item = &Artifact> {
        self.artifacts
            .iter()
            .filter(move |artifact| include_sensitive || !artifact.sensitive)
    }
}

/// `"DNS Records"` -> `"dns-records"`.
fn anchor_for(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Results gathered for one target, one section per module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Random report identifier
    pub id: Uuid,
    /// Normalised target value
    pub target: String,
    /// Creation time
    pub created: Timestamp,
    /// Sections in insertion order
    pub sections: Vec<ReportSection>,
}

impl Report {
    /// Empty report for `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            created: Timestamp::now(),
            sections: Vec::new(),
        }
    }

    /// Start over if `target` differs from this report's target.
    fn retarget(&mut self, target: &str) {
        if self.target != target {
            tracing::debug!(from = %self.target, to = target, "Report target changed, starting a new report");
            *self = Self::new(target);
        }
    }

    /// Insert or replace the section for `result`'s module.
    pub fn upsert(&mut self, result: &ModuleResult) {
        self.retarget(&result.entity);
        let section = ReportSection::from_result(result);
        match self
            .sections
            .iter_mut()
            .find(|existing| existing.module_id == section.module_id)
        {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Replace every section with the given results for `target`.
    pub fn ingest(&mut self, target: &str, results: &[ModuleResult]) {
        self.retarget(target);
        self.sections = results.iter().map(ReportSection::from_result).collect();
    }

    /// Section produced by `module_id`.
    #[must_use]
    pub fn section(&self, module_id: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.module_id == module_id)
    }
}
