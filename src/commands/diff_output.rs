//! Rendering of comparison results for the terminal.

use anyhow::Result;
use console::style;

use crate::diff::types::{DetailKind, DiffType, RiskLevel, SchemaComparison, SchemaDifference};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffFormat {
    /// Counts per kind of difference
    Summary,
    /// One line per difference plus its details
    #[default]
    Detailed,
    /// The full comparison as JSON
    Json,
}

fn marker(diff_type: DiffType) -> console::StyledObject<&'static str> {
    match diff_type {
        DiffType::Added => style("+").green(),
        DiffType::Removed => style("-").red(),
        DiffType::Modified => style("~").yellow(),
        DiffType::Moved => style(">").cyan(),
    }
}

fn risk_label(risk: RiskLevel) -> String {
    match risk {
        RiskLevel::Low => style("low").dim().to_string(),
        RiskLevel::Medium => style("medium").yellow().to_string(),
        RiskLevel::High => style("high").red().to_string(),
        RiskLevel::DataLoss => style("DATA LOSS").red().bold().to_string(),
    }
}

fn render_difference(diff: &SchemaDifference, out: &mut Vec<String>) {
    out.push(format!(
        "{} {} [{}] ({})",
        marker(diff.diff_type),
        diff.label(),
        diff.diff_type,
        risk_label(diff.risk())
    ));

    for detail in &diff.details {
        out.push(format!("    {}", detail.description));
        if let DetailKind::DefinitionChanged { diff } = &detail.kind {
            for line in diff.lines() {
                out.push(format!("      {}", style(line).dim()));
            }
        }
    }
}

pub fn format_comparison(comparison: &SchemaComparison, format: DiffFormat) -> Result<String> {
    if format == DiffFormat::Json {
        return Ok(serde_json::to_string_pretty(comparison)?);
    }

    let summary = comparison.summary();
    let mut out = vec![format!(
        "{} {} -> {}",
        style("Comparing").bold(),
        comparison.source.label,
        comparison.target.label
    )];

    if comparison.is_identical() {
        out.push(style("No differences found").green().to_string());
        return Ok(out.join("\n"));
    }

    if format == DiffFormat::Detailed {
        out.push(String::new());
        for diff in &comparison.differences {
            render_difference(diff, &mut out);
        }
    }

    out.push(String::new());
    out.push(format!(
        "{} differences: {} added, {} removed, {} modified, {} moved",
        summary.total(),
        summary.added,
        summary.removed,
        summary.modified,
        summary.moved
    ));
    if summary.data_loss > 0 {
        out.push(
            style(format!(
                "{} of them lose data when applied",
                summary.data_loss
            ))
            .red()
            .to_string(),
        );
    }

    Ok(out.join("\n"))
}
