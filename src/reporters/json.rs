//! JSON reporter
//!
//! Serializes the report dict shape consumed by CI pipelines and editor
//! tooling. Issues are display-deduplicated; blocks and the hotspot are
//! included only when present, so trivial reports stay small.

use crate::models::EnergyReport;
use crate::reporters::dedupe_issues;
use anyhow::Result;
use serde_json::{json, Map, Value};

/// Render report as pretty-printed JSON
pub fn render(report: &EnergyReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_value(report))?)
}

/// Build the JSON value for one report
pub fn to_value(report: &EnergyReport) -> Value {
    let issues = dedupe_issues(&report.issues);

    let mut out = Map::new();
    out.insert("filename".to_string(), json!(report.filename));
    out.insert("score".to_string(), json!(report.score));
    out.insert("grade".to_string(), json!(report.grade.letter));
    out.insert(
        "grade_description".to_string(),
        json!(report.grade.description),
    );
    out.insert("grade_icon".to_string(), json!(report.grade.icon));
    out.insert("source_lines".to_string(), json!(report.source_lines));
    out.insert("issues".to_string(), json!(issues));
    out.insert("issues_count".to_string(), json!(issues.len()));
    out.insert("components".to_string(), json!(report.components));

    if !report.blocks.is_empty() {
        out.insert("blocks".to_string(), json!(report.blocks));
        out.insert("blocks_count".to_string(), json!(report.blocks.len()));
    }

    if let Some(hotspot) = report.hotspot() {
        out.insert("hotspot".to_string(), json!(hotspot));
        out.insert(
            "hotspot_range".to_string(),
            json!([hotspot.start_line, hotspot.end_line]),
        );
    }

    Value::Object(out)
}
