//! Editor diagnostics shaping
//!
//! Groups issues into LSP-shaped diagnostics, one per containing block, and
//! extracts a single refactor target from the hotspot. Ranges are 0-based
//! line/character pairs as the protocol expects.

use crate::models::{BlockType, EnergyReport, Issue};
use anyhow::Result;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Diagnostics plus the one region worth a refactor code action
#[derive(Debug, Clone)]
pub struct DiagnosticsBundle {
    pub diagnostics: Vec<Value>,
    pub refactor_target: Option<Value>,
}

/// Render the bundle as JSON
pub fn render(report: &EnergyReport) -> Result<String> {
    let bundle = build(report);
    Ok(serde_json::to_string_pretty(&json!({
        "diagnostics": bundle.diagnostics,
        "refactor_target": bundle.refactor_target,
    }))?)
}

/// Build grouped diagnostics and the refactor target for one report
pub fn build(report: &EnergyReport) -> DiagnosticsBundle {
    // Non-module block ranges, used to attach issues to their smallest
    // containing block.
    let block_ranges: Vec<(u32, u32)> = report
        .blocks
        .iter()
        .filter(|b| b.block_type != BlockType::Module)
        .map(|b| (b.start_line, b.end_line))
        .collect();

    let mut grouped: BTreeMap<(u32, u32), Vec<&Issue>> = BTreeMap::new();
    for issue in &report.issues {
        let Some(line) = issue.line else {
            continue;
        };

        let containing = block_ranges
            .iter()
            .filter(|(start, end)| *start <= line && line <= *end)
            .min_by_key(|(start, end)| end - start)
            .copied()
            .unwrap_or((line, line));

        grouped.entry(containing).or_default().push(issue);
    }

    let mut diagnostics: Vec<Value> = grouped
        .iter()
        .map(|((start, end), issues)| {
            let worst = issues.iter().map(|i| i.severity).max().unwrap_or(1);
            let message = if issues.len() == 1 {
                issues[0].message.clone()
            } else {
                let mut categories: Vec<&str> = Vec::new();
                for issue in issues {
                    let name = issue.category.as_str();
                    if !categories.contains(&name) {
                        categories.push(name);
                    }
                }
                categories.truncate(2);
                format!(
                    "{} energy issues detected ({})",
                    issues.len(),
                    categories.join(", ")
                )
            };

            json!({
                "range": {
                    "start": {"line": start - 1, "character": 0},
                    "end": {"line": end, "character": 0},
                },
                "severity": lsp_severity(worst),
                "source": "ecoscan",
                "message": message,
                "code": "energy-inefficiency",
                "relatedInformation": related_information(issues),
            })
        })
        .collect();

    // Worst first, then top-down.
    diagnostics.sort_by_key(|d| {
        (
            d["severity"].as_i64().unwrap_or(4),
            d["range"]["start"]["line"].as_i64().unwrap_or(0),
        )
    });

    let refactor_target = report.hotspot().map(|hotspot| {
        let in_hotspot: Vec<&Issue> = report
            .issues
            .iter()
            .filter(|i| {
                i.line
                    .is_some_and(|l| hotspot.start_line <= l && l <= hotspot.end_line)
            })
            .collect();
        let severity = in_hotspot.iter().map(|i| i.severity).max().unwrap_or(2);

        json!({
            "range": {
                "start": {"line": hotspot.start_line - 1, "character": 0},
                "end": {"line": hotspot.end_line, "character": 0},
            },
            "severity": lsp_severity(severity),
            "source": "ecoscan",
            "message": format!(
                "Energy hotspot - {} issues (refactor recommended)",
                in_hotspot.len()
            ),
            "code": "energy-hotspot",
            "relatedInformation": related_information(&in_hotspot),
            "_is_refactor_target": true,
        })
    });

    DiagnosticsBundle {
        diagnostics,
        refactor_target,
    }
}

/// Up to five issue locations backing one diagnostic
fn related_information(issues: &[&Issue]) -> Vec<Value> {
    issues
        .iter()
        .filter(|i| i.line.is_some())
        .take(5)
        .map(|issue| {
            let line = issue.line.unwrap_or(1);
            let character = issue.column.unwrap_or(0);
            json!({
                "location": {
                    "range": {
                        "start": {"line": line - 1, "character": character},
                        "end": {"line": line - 1, "character": character + 1},
                    }
                },
                "message": issue.message,
            })
        })
        .collect()
}

/// Map issue severity (1-3) onto LSP: Error, Warning, or Information
fn lsp_severity(severity: u8) -> u8 {
    match severity {
        s if s >= 3 => 1,
        2 => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_ranges_are_zero_based() {
        let report = test_report();
        let bundle = build(&report);
        assert!(!bundle.diagnostics.is_empty());

        for diagnostic in &bundle.diagnostics {
            let start = diagnostic["range"]["start"]["line"].as_u64().expect("line");
            let issue_lines: Vec<u64> = report
                .issues
                .iter()
                .filter_map(|i| i.line.map(u64::from))
                .collect();
            // 0-based start is strictly below every 1-based issue line it could cover.
            assert!(start < *issue_lines.iter().max().expect("issue lines"));
        }
    }

    #[test]
    fn test_sorted_worst_first() {
        let report = test_report();
        let bundle = build(&report);
        let severities: Vec<i64> = bundle
            .diagnostics
            .iter()
            .map(|d| d["severity"].as_i64().expect("severity"))
            .collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
    }

    #[test]
    fn test_refactor_target_matches_hotspot() {
        let report = test_report();
        let bundle = build(&report);
        let target = bundle.refactor_target.expect("refactor target");
        let (start, _end) = report.hotspot_region().expect("hotspot");

        assert_eq!(target["code"], json!("energy-hotspot"));
        assert_eq!(target["_is_refactor_target"], json!(true));
        assert_eq!(target["range"]["start"]["line"], json!(start - 1));
    }

    #[test]
    fn test_no_hotspot_no_target() {
        let mut report = test_report();
        report.hotspot = None;
        let bundle = build(&report);
        assert!(bundle.refactor_target.is_none());
    }

    #[test]
    fn test_lsp_severity_mapping() {
        assert_eq!(lsp_severity(3), 1);
        assert_eq!(lsp_severity(2), 2);
        assert_eq!(lsp_severity(1), 3);
    }
}
