//! Analysis driver behind the CLI
//!
//! Resolves the input (stdin, file, or directory walk), fans the per-file
//! pipeline out over a rayon pool, and renders the reports in the requested
//! format. Each worker gets its own analyzer; the engine and its
//! configuration are shared read-only.

use crate::analyzer::Analyzer;
use crate::config;
use crate::integrations;
use crate::models::{EnergyReport, Issue, IssueCategory};
use crate::reporters::{self, OutputFormat};
use crate::scoring::ScoringEngine;
use anyhow::{bail, Context, Result};
use console::style;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File extensions picked up by the directory walk
const SUPPORTED_EXTENSIONS: &[&str] = &["py", "pyi"];

pub(crate) fn run(cli: &super::Cli) -> Result<()> {
    if cli.path.as_os_str() == "-" {
        return run_stdin(cli);
    }

    if !cli.path.exists() {
        bail!("path not found: {}", cli.path.display());
    }

    let root = if cli.path.is_dir() {
        cli.path.clone()
    } else {
        cli.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };
    let engine = ScoringEngine::with_config(config::load_or_default(&root).engine_config());

    let files = if cli.path.is_file() {
        vec![cli.path.clone()]
    } else {
        collect_files(&cli.path)
    };
    if files.is_empty() {
        bail!("no Python files found under {}", cli.path.display());
    }

    info!("analyzing {} file(s) with {} workers", files.len(), cli.workers);

    let progress = (files.len() > 1 && cli.format == "text").then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("  [{bar:40.green}] {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    });

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.workers)
        .build()
        .context("failed to build worker pool")?;
    let mut reports: Vec<EnergyReport> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let report = analyze_path(path, &engine, cli);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                report
            })
            .collect::<Result<Vec<_>>>()
    })?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    // Walk order depends on the filesystem; pin the output order.
    reports.sort_by(|a, b| a.filename.cmp(&b.filename));

    let rendered = render_all(&reports, cli)?;
    emit(&rendered, cli)?;
    gate(&reports, cli)
}

fn run_stdin(cli: &super::Cli) -> Result<()> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read stdin")?;

    let engine =
        ScoringEngine::with_config(config::load_or_default(Path::new(".")).engine_config());
    let report = build_report(&source, "<stdin>", &engine, cli, 0);
    let rendered = reporters::report(&report, &cli.format)?;
    emit(&rendered, cli)?;
    gate(&[report], cli)
}

/// Gitignore-aware walk collecting Python sources
fn collect_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .build();

    let mut files = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if SUPPORTED_EXTENSIONS.contains(&ext) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

fn analyze_path(path: &Path, engine: &ScoringEngine, cli: &super::Cli) -> Result<EnergyReport> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let structural_warnings = if cli.lint {
        integrations::structural_warning_count(path).unwrap_or(0)
    } else {
        0
    };

    Ok(build_report(
        &source,
        &path.display().to_string(),
        engine,
        cli,
        structural_warnings,
    ))
}

/// Run the analyzer, fold in optional signals, and score
fn build_report(
    source: &str,
    filename: &str,
    engine: &ScoringEngine,
    cli: &super::Cli,
    structural_warnings: usize,
) -> EnergyReport {
    let analyzer = Analyzer::with_depth_sensitivity(engine.config().depth_sensitivity);
    let outcome = analyzer.analyze(source);
    if outcome.parse_failed() {
        warn!("{filename}: source did not parse; reporting no findings");
    }
    let (mut issues, blocks) = outcome.into_parts();

    let cyclomatic_complexity = if cli.complexity {
        integrations::max_cyclomatic_complexity(source)
    } else {
        None
    };
    if let Some(cc) = cyclomatic_complexity {
        if cc > engine.config().cc_threshold {
            issues.push(Issue {
                category: IssueCategory::CyclomaticComplexity,
                message: "High cyclomatic complexity".to_string(),
                line: None,
                column: None,
                severity: 2,
                detail: Some(format!("complexity {cc}")),
                estimated_impact: None,
            });
        }
    }

    engine.compute_report(
        issues,
        blocks,
        source,
        filename,
        cyclomatic_complexity,
        structural_warnings,
    )
}

fn render_all(reports: &[EnergyReport], cli: &super::Cli) -> Result<String> {
    let format: OutputFormat = cli.format.parse()?;

    if reports.len() == 1 {
        return reporters::report_with_format(&reports[0], format);
    }

    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for report in reports {
                out.push_str(&format!("\n--- {} ---\n", report.filename));
                out.push_str(&reporters::report_with_format(report, format)?);
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let values: Vec<_> = reports.iter().map(reporters::json_value).collect();
            Ok(serde_json::to_string_pretty(&values)?)
        }
        OutputFormat::Diagnostics => {
            let values: Vec<_> = reports
                .iter()
                .map(|report| {
                    let bundle = reporters::diagnostics::build(report);
                    serde_json::json!({
                        "filename": report.filename,
                        "diagnostics": bundle.diagnostics,
                        "refactor_target": bundle.refactor_target,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&values)?)
        }
    }
}

fn emit(rendered: &str, cli: &super::Cli) -> Result<()> {
    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to {}", style(path.display()).green());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// CI gate: fail the process when any score drops below the threshold
fn gate(reports: &[EnergyReport], cli: &super::Cli) -> Result<()> {
    let Some(threshold) = cli.fail_under else {
        return Ok(());
    };

    let failing: Vec<&EnergyReport> = reports.iter().filter(|r| r.score < threshold).collect();
    if failing.is_empty() {
        return Ok(());
    }

    for report in &failing {
        eprintln!(
            "{}",
            style(format!(
                "{}: score {} below threshold {}",
                report.filename, report.score, threshold
            ))
            .red()
        );
    }
    std::process::exit(1);
}
