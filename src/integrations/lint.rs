//! Structural warning signal via an external linter
//!
//! Runs pylint in JSON mode against a single file and counts its messages.
//! The count is folded into scoring as flat structural-warning issues. Any
//! failure (tool missing, timeout at the OS level, unparsable output)
//! degrades to `None`.

use serde_json::Value as JsonValue;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Number of linter messages for the file, or `None` when the linter is
/// unavailable or its output cannot be read
pub fn structural_warning_count(path: &Path) -> Option<usize> {
    let output = Command::new("pylint")
        .arg("--output-format=json")
        .arg("--reports=no")
        .arg(path)
        .output();

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            debug!("pylint unavailable: {err}");
            return None;
        }
    };

    // pylint exits non-zero whenever it has messages; the JSON on stdout is
    // valid either way.
    let messages: JsonValue = match serde_json::from_slice(&output.stdout) {
        Ok(messages) => messages,
        Err(err) => {
            debug!("could not parse pylint output: {err}");
            return None;
        }
    };

    let count = messages.as_array().map(|a| a.len());
    if let Some(count) = count {
        debug!("pylint reported {count} messages for {}", path.display());
    }
    count
}
