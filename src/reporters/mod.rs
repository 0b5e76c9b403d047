//! Output reporters for energy analysis results
//!
//! Supported formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON
//! - `diagnostics` - LSP-shaped diagnostics plus a refactor target for
//!   editor integrations
//!
//! Every reporter consumes only the [`EnergyReport`] contract.

pub mod diagnostics;
mod json;
pub mod prompt;
mod text;

use crate::models::{EnergyReport, Issue};
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Diagnostics,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "diagnostics" | "lsp" => Ok(OutputFormat::Diagnostics),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, diagnostics",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

/// Render a report in the named format
pub fn report(report: &EnergyReport, format: &str) -> Result<String> {
    let format = OutputFormat::from_str(format)?;
    report_with_format(report, format)
}

/// Render a report using an [`OutputFormat`]
pub fn report_with_format(report: &EnergyReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Diagnostics => diagnostics::render(report),
    }
}

/// Render a JSON value for the report (used when aggregating multiple files)
pub fn json_value(report: &EnergyReport) -> serde_json::Value {
    json::to_value(report)
}

/// Drop repeated findings for display, keyed by category, line, and message
pub(crate) fn dedupe_issues(issues: &[Issue]) -> Vec<&Issue> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for issue in issues {
        let key = (issue.category, issue.line, issue.message.clone());
        if seen.insert(key) {
            result.push(issue);
        }
    }
    result
}
