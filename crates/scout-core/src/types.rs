//! Result types shared by modules, the scanner and report export.

use crate::entity::Entity;
use crate::error::ScoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One atomic extracted fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Short label, e.g. `"A example.com."`
    pub title: String,
    /// Extracted value
    pub value: String,
    /// Optional free-text context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Withheld from privacy-preserving exports
    #[serde(default)]
    pub sensitive: bool,
}

impl Artifact {
    /// Create a non-sensitive artifact without context.
    #[must_use]
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            context: None,
            sensitive: false,
        }
    }

    /// Attach free-text context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Mark as sensitive.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Output of one module run for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    /// Stable module identifier, e.g. `domain.dns`
    pub module_id: String,
    /// Module display name
    pub module_name: String,
    /// Normalized entity value that was queried
    pub entity: String,
    /// Human-readable summary
    pub summary: String,
    /// Extracted facts, in module order
    pub artifacts: Vec<Artifact>,
    /// Source URLs, unique, in insertion order
    pub source_links: Vec<String>,
    /// Free-form auxiliary data
    pub raw: BTreeMap<String, serde_json::Value>,
    /// When the result was produced
    pub timestamp: Timestamp,
}

impl ModuleResult {
    /// Start an empty result for `entity`.
    #[must_use]
    pub fn new(
        module_id: impl Into<String>,
        module_name: impl Into<String>,
        entity: &Entity,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            module_name: module_name.into(),
            entity: entity.value().to_string(),
            summary: String::new(),
            artifacts: Vec::new(),
            source_links: Vec::new(),
            raw: BTreeMap::new(),
            timestamp: Timestamp::now(),
        }
    }

    /// Degraded result for a module that errored: no artifacts and the error in the summary.
    #[must_use]
    pub fn failed(
        module_id: impl Into<String>,
        module_name: impl Into<String>,
        entity: &Entity,
        error: &dyn fmt::Display,
    ) -> Self {
        let mut result = Self::new(module_id, module_name, entity);
        result.summary = format!("{} failed: {error}", result.module_name);
        result
    }

    /// Set the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Append an artifact.
    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Record a source URL unless already present.
    pub fn add_link(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.source_links.contains(&url) {
            self.source_links.push(url);
        }
    }

    /// Store an auxiliary value.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.raw.insert(key.into(), value);
    }

    /// Whether this result was synthesized from a module error.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.artifacts.is_empty() && self.summary.starts_with(&format!("{} failed:", self.module_name))
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, ScoutError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ScoutError::Decoding(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Microseconds since Unix epoch.
    #[must_use]
    pub fn timestamp_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
