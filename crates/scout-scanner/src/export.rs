//! Rendering reports as Markdown, JSON or CSV.
//!
//! Privacy mode is the default: sensitive artifacts are left out unless
//! [`ExportOptions::include_sensitive`] is set.

use crate::error::ExportError;
use crate::report::{Report, ReportSection};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Human-readable document with a table of contents
    #[default]
    Markdown,
    /// Pretty-printed JSON with sorted keys
    Json,
    /// One row per artifact
    Csv,
}

impl ExportFormat {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Export switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Keep artifacts flagged sensitive
    pub include_sensitive: bool,
}

/// Render `report` in `format`.
pub fn render(report: &Report, format: ExportFormat, options: ExportOptions) -> Result<String, ExportError> {
    match format {
        ExportFormat::Markdown => Ok(to_markdown(report, options)),
        ExportFormat::Json => to_json(report, options),
        ExportFormat::Csv => Ok(to_csv(report, options)),
    }
}

/// Render `report` and write it to `path`.
pub fn write_to(
    report: &Report,
    format: ExportFormat,
    options: ExportOptions,
    path: &Path,
) -> Result<(), ExportError> {
    let rendered = render(report, format, options)?;
    std::fs::write(path, rendered)?;
    tracing::info!(path = %path.display(), %format, "Report exported");
    Ok(())
}

/// Markdown document: header, contents, then one section per module.
#[must_use]
pub fn to_markdown(report: &Report, options: ExportOptions) -> String {
    let mut lines = vec![
        "# OSINT Scout Report".to_string(),
        format!("- Generated: {}", report.created),
        format!("- Target: {}", report.target),
        format!("- Report ID: {}", report.id),
        String::new(),
        "## Contents".to_string(),
    ];
    lines.extend(
        report
            .sections
            .iter()
            .map(|section| format!("- [{}](#{})", section.title, section.anchor)),
    );
    lines.push(String::new());

    for section in &report.sections {
        lines.push(format!("## {}", section.title));
        lines.push(format!("Source: {}", section.source));
        lines.push(String::new());
        lines.push(section.summary.clone());
        lines.push(String::new());
        for artifact in section.visible_artifacts(options.include_sensitive) {
            lines.push(match &artifact.context {
                Some(context) => format!("- **{}**: {} ({context})", artifact.title, artifact.value),
                None => format!("- **{}**: {}", artifact.title, artifact.value),
            });
        }
        if !section.links.is_empty() {
            lines.push(String::new());
            lines.push("### Links".to_string());
            lines.extend(section.links.iter().map(|link| format!("- {link}")));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Pretty JSON with keys sorted at every level.
pub fn to_json(report: &Report, options: ExportOptions) -> Result<String, ExportError> {
    let mut filtered = report.clone();
    if !options.include_sensitive {
        for section in &mut filtered.sections {
            section.artifacts.retain(|artifact| !artifact.sensitive);
        }
    }
    // serde_json::Map is ordered by key, so a round trip through Value sorts every object.
    let value = serde_json::to_value(&filtered)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// CSV with header `module,title,artifact_title,artifact_value`.
///
/// Sections with no visible artifacts still get one row with empty artifact
/// columns.
#[must_use]
pub fn to_csv(report: &Report, options: ExportOptions) -> String {
    let mut rows = vec!["module,title,artifact_title,artifact_value".to_string()];
    for section in &report.sections {
        let mut artifacts = section.visible_artifacts(options.include_sensitive).peekable();
        if artifacts.peek().is_none() {
            rows.push(csv_row(section, "", ""));
        }
        for artifact in artifacts {
            rows.push(csv_row(section, &artifact.title, &artifact.value));
        }
    }
    rows.join("\n")
}

fn csv_row(section: &ReportSection, artifact_title: &str, artifact_value: &str) -> String {
    [
        section.module_id.as_str(),
        section.title.as_str(),
        artifact_title,
        artifact_value,
    ]
    .iter()
    .map(|field| csv_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Quote a field when it contains a comma, quote or line break, doubling inner quotes.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
