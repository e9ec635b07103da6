//! Report generation.
//!
//! This module renders an aggregated page either as the JSON array
//! returned by the aggregator or as a Markdown document of entry cards.

use crate::models::{PageReport, ReportMetadata, Summary};
use anyhow::{Context, Result};
use serde_json::Number;
use std::path::Path;

/// Generate the JSON array of summaries.
pub fn generate_json_report(report: &PageReport) -> Result<String> {
    serde_json::to_string_pretty(&report.items).map_err(Into::into)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &PageReport) -> String {
    let mut output = String::new();

    output.push_str("# Catalog Page\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, report.len()));

    if report.is_empty() {
        output.push_str("No entries on this page.\n");
        return output;
    }

    output.push_str("## Entries\n\n");
    for summary in &report.items {
        output.push_str(&generate_card(summary));
    }

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, count: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Page:** {} (limit {}, offset {})\n",
        metadata.page, metadata.limit, metadata.offset
    ));
    section.push_str(&format!("- **Entries:** {}\n", count));
    section.push_str(&format!(
        "- **Fetched:** {} in {:.1}s\n",
        metadata.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Render a single entry card.
fn generate_card(summary: &Summary) -> String {
    let mut card = String::new();

    let name = summary.name.as_deref().unwrap_or("(unnamed)");
    card.push_str(&format!("### {}\n\n", name));

    match summary.image {
        Some(ref image) => card.push_str(&format!("![{}]({})\n\n", name, image)),
        None => card.push_str("- **Image:** n/a\n"),
    }

    let types = if summary.types.is_empty() {
        "n/a".to_string()
    } else {
        summary.types.join(", ")
    };
    card.push_str(&format!("- **Types:** {}\n", types));
    card.push_str(&format!("- **Height:** {}\n", display_number(&summary.height)));
    card.push_str(&format!("- **Weight:** {}\n\n", display_number(&summary.weight)));

    card
}

fn display_number(value: &Option<Number>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "n/a".to_string())
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output to {}", path.display()))
}
