//! Refactoring prompt builder
//!
//! Produces the instruction text an external refactoring assistant receives
//! for the hotspot region: the exact lines to replace, the issues found in
//! them, and the constraints the replacement must respect.

use crate::models::EnergyReport;

/// Build a targeted refactoring prompt for the report's hotspot
///
/// `original_code` is the full source the report was computed from; the
/// hotspot lines are excerpted from it.
pub fn refactor_prompt(report: &EnergyReport, original_code: &str) -> String {
    let Some(hotspot) = report.hotspot() else {
        return "No hotspot detected for refactoring.".to_string();
    };

    let start = hotspot.start_line as usize;
    let end = hotspot.end_line as usize;

    let lines: Vec<&str> = original_code.lines().collect();
    let excerpt = if start <= lines.len() {
        lines[start - 1..end.min(lines.len())].join("\n")
    } else {
        String::new()
    };

    let mut prompt = format!(
        "You are a code refactoring assistant. REPLACE the code at lines {start}-{end} \
with an optimized version.\n\n\
## ORIGINAL CODE TO REPLACE (lines {start}-{end}):\n\
```python\n{}\n```\n\n\
## ISSUES TO FIX IN THIS REGION:\n",
        if excerpt.is_empty() { "[Code not provided]" } else { &excerpt }
    );

    for issue in report.issues.iter().filter(|i| {
        i.line
            .is_some_and(|l| hotspot.start_line <= l && l <= hotspot.end_line)
    }) {
        prompt.push_str(&format!("- Line {}: {}", issue.line.unwrap_or(0), issue.message));
        if let Some(detail) = &issue.detail {
            prompt.push_str(&format!(" ({detail})"));
        }
        if let Some(impact) = issue.estimated_impact {
            prompt.push_str(&format!(" [Impact: {impact:.1}]"));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\n## REFACTORING REQUIREMENTS:\n\
1. KEEP THE SAME FUNCTION NAME AND SIGNATURE\n\
2. Return only the code that replaces lines {start}-{end}\n\
3. Do not introduce new functions or keep the original code\n\
4. Maintain the original indentation level\n\
5. Preserve behavior; only improve efficiency\n\n\
## OPTIMIZATION GUIDELINES:\n\
- Reduce computational complexity (avoid nested loops, use early breaks)\n\
- Minimize allocations inside loops (pre-allocate, use generators)\n\
- Move expensive operations out of loops\n\
- Replace recursion with iteration where possible\n\
- Use appropriate data structures (sets for lookups)\n\n\
## OUTPUT FORMAT:\n\
Return ONLY the refactored code for lines {start}-{end}, no explanations, \
no markdown fences, just raw Python.\n"
    ));

    prompt
}
