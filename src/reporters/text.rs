//! Text (terminal) reporter with colors

use crate::models::EnergyReport;
use crate::reporters::dedupe_issues;
use anyhow::Result;

/// Grade colors (ANSI escape codes)
fn grade_color(letter: &str) -> &'static str {
    match letter {
        "A" => "\x1b[32m", // Green
        "B" => "\x1b[92m", // Light green
        "C" => "\x1b[33m", // Yellow
        "D" => "\x1b[91m", // Light red
        "E" | "F" => "\x1b[31m", // Red
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Issues shown per category before eliding the rest
const ISSUES_PER_CATEGORY: usize = 5;

/// Render report as formatted terminal output
pub fn render(report: &EnergyReport) -> Result<String> {
    let mut out = String::new();

    let grade_c = grade_color(report.grade.letter);
    let filename = if report.filename.is_empty() {
        "<source>"
    } else {
        &report.filename
    };

    out.push_str(&format!("\n{BOLD}Ecoscan Energy Report{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!("File: {filename}  Lines: {}\n", report.source_lines));
    out.push_str(&format!(
        "Score: {BOLD}{}/100{RESET}  Grade: {grade_c}{BOLD}{}{RESET} {} {}\n\n",
        report.score, report.grade.letter, report.grade.icon, report.grade.description
    ));

    // Component breakdown
    let c = &report.components;
    out.push_str(&format!("{BOLD}COMPONENTS{RESET}\n"));
    out.push_str(&format!("  Raw penalty: {}\n", c.raw_penalty));
    out.push_str(&format!("  Energy: {}  Issues: {}  Complexity: {}\n", c.energy_component, c.issue_component, c.complexity_component));
    out.push_str(&format!(
        "  {DIM}S = {}, {}{RESET}\n\n",
        c.scaling_constant, c.formula
    ));

    // Hotspot callout
    if let Some(hotspot) = report.hotspot() {
        out.push_str(&format!(
            "{BOLD}HOTSPOT{RESET} {} at lines {}-{}\n",
            hotspot.block_type, hotspot.start_line, hotspot.end_line
        ));
        out.push_str(&format!(
            "  Energy: {:.2}  Energy/line: {:.2}\n",
            hotspot.total_energy, hotspot.energy_per_line
        ));
        out.push_str(&format!(
            "  {DIM}Target this region first when refactoring.{RESET}\n\n"
        ));
    }

    // Issues grouped by category
    let deduped = dedupe_issues(&report.issues);
    if deduped.is_empty() {
        out.push_str("No energy inefficiency issues detected.\n");
        return Ok(out);
    }

    out.push_str(&format!("{BOLD}ISSUES{RESET} ({} unique)\n", deduped.len()));
    let report_for_grouping = EnergyReport {
        issues: deduped.iter().map(|i| (*i).clone()).collect(),
        ..report.clone()
    };
    for (category, issues) in report_for_grouping.issues_by_category() {
        out.push_str(&format!("\n  [{category}]\n"));
        for issue in issues.iter().take(ISSUES_PER_CATEGORY) {
            let mut line = match issue.line {
                Some(l) => format!("  • Line {l}: {}", issue.message),
                None => format!("  • {}", issue.message),
            };
            if let Some(detail) = &issue.detail {
                line.push_str(&format!(" ({detail})"));
            }
            if let Some(impact) = issue.estimated_impact {
                line.push_str(&format!(" [impact: {impact:.1}]"));
            }
            line.push('\n');
            out.push_str(&line);
        }
        if issues.len() > ISSUES_PER_CATEGORY {
            out.push_str(&format!(
                "  {DIM}... and {} more{RESET}\n",
                issues.len() - ISSUES_PER_CATEGORY
            ));
        }
    }

    Ok(out)
}
