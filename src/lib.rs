//! Ecoscan - energy-efficiency static analysis for Python
//!
//! Walks a tree-sitter parse of Python source, charges heuristic energy
//! costs to loops, allocations, recursion, and expensive calls, and folds
//! them into a single 0-100 efficiency score with a letter grade and a
//! refactoring hotspot.
//!
//! The analysis is purely static and heuristic: it does not execute code or
//! measure real power draw, and detection makes no completeness claim. Use
//! the score as relative guidance.
//!
//! ```no_run
//! let report = ecoscan::analyze_source("for i in range(10):\n    x = [i]\n", "snippet.py");
//! println!("{} ({})", report.score, report.grade.letter);
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod integrations;
pub mod models;
pub mod reporters;
pub mod rules;
pub mod scoring;

use crate::analyzer::Analyzer;
use crate::models::EnergyReport;
use crate::scoring::ScoringEngine;
use anyhow::{Context, Result};
use std::path::Path;

/// Analyze a source string with default configuration
///
/// Unparsable source degrades to an empty-findings report; use
/// [`analyzer::Analyzer::analyze`] directly to distinguish that case.
pub fn analyze_source(source: &str, filename: &str) -> EnergyReport {
    let (issues, blocks) = Analyzer::new().analyze(source).into_parts();
    ScoringEngine::new().compute_report(issues, blocks, source, filename, None, 0)
}

/// Analyze a file on disk with default configuration
pub fn analyze_file(path: &Path) -> Result<EnergyReport> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(analyze_source(&source, &path.display().to_string()))
}
