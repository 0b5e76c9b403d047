//! CLI command definitions and handlers

mod analyze;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Ecoscan - energy efficiency static analysis for Python
#[derive(Parser, Debug)]
#[command(name = "ecoscan")]
#[command(
    version,
    about = "Energy-efficiency static analysis for Python — score source 0-100 and find the hotspot worth refactoring",
    long_about = "Ecoscan walks the syntax tree of Python source, charges heuristic energy \
costs to loops, allocations, recursion, and expensive calls, and folds them \
into a single 0-100 efficiency score with a letter grade.\n\n\
The analysis is fully static: nothing is executed, and no measurement \
hardware is involved. Treat the score as refactoring guidance, not as a \
certified energy figure.",
    after_help = "\
Examples:
  ecoscan app.py                       Analyze one file
  ecoscan src/                         Analyze every Python file in a tree
  cat app.py | ecoscan                 Analyze stdin
  ecoscan src/ --format json           JSON output for scripting
  ecoscan app.py --format diagnostics  LSP-shaped output for editors
  ecoscan src/ --complexity --lint     Include optional external signals
  ecoscan src/ --fail-under 60         Exit 1 when any file scores below 60 (CI mode)"
)]
pub struct Cli {
    /// Python file or directory to analyze; '-' reads from stdin
    #[arg(default_value = "-")]
    pub path: PathBuf,

    /// Output format: text, json, diagnostics
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "diagnostics"])]
    pub format: String,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Include the cyclomatic complexity signal
    #[arg(long)]
    pub complexity: bool,

    /// Include structural warnings from pylint when available
    #[arg(long)]
    pub lint: bool,

    /// Exit with status 1 when any file scores below this value
    #[arg(long, value_name = "SCORE")]
    pub fail_under: Option<u32>,

    /// Number of parallel workers (1-64)
    #[arg(long, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    analyze::run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers_bounds() {
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("abc").is_err());
        assert_eq!(parse_workers("8").unwrap(), 8);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ecoscan"]);
        assert_eq!(cli.path, PathBuf::from("-"));
        assert_eq!(cli.format, "text");
        assert!(!cli.complexity);
        assert!(!cli.lint);
        assert_eq!(cli.workers, 8);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["ecoscan", "--format", "yaml"]).is_err());
    }
}
