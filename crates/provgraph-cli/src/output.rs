//! Output layer: human text or JSON for every command.
//!
//! Commands build a [`serde_json::Value`] for JSON mode and a closure that
//! writes the human form; [`emit`] picks one based on [`OutputMode`].

use std::io::{self, Write};

use anyhow::{Context, Result};
use provgraph_core::GraphError;
use serde::Serialize;
use serde_json::Value;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable lines.
    Human,
    /// Machine-readable JSON (one pretty-printed document).
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Write `value` (JSON mode) or run `human` (human mode) against stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn emit<F>(mode: OutputMode, value: &Value, human: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(value).context("serialize output")?;
            writeln!(out, "{json}").context("write output")
        }
        OutputMode::Human => human(&mut out).context("write output"),
    }
}

/// A command failure with an optional error code and suggestion.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// `G####` code when the failure came from a graph algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Flatten an error chain, picking up the code and hint of the first
    /// [`GraphError`] in it.
    #[must_use]
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let graph = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<GraphError>());
        Self {
            message: format!("{err:#}"),
            suggestion: graph
                .and_then(|e| e.code().hint())
                .map(str::to_string),
            error_code: graph.map(|e| e.code().code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
///
/// # Errors
///
/// Returns an error if writing to stderr fails.
pub fn render_error(mode: OutputMode, error: &CliError) -> Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(code) = &error.error_code {
                writeln!(out, "  code: {code}")?;
            }
            if let Some(suggestion) = &error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_selects_mode() {
        assert_eq!(OutputMode::from_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_flag(false), OutputMode::Human);
    }

    #[test]
    fn graph_errors_carry_code_and_hint() {
        let err = anyhow::Error::from(GraphError::CycleBudgetExceeded { limit: 5 })
            .context("dagify");
        let cli = CliError::from_anyhow(&err);
        assert!(cli.message.starts_with("dagify: "));
        assert_eq!(cli.error_code.as_deref(), Some("G3002"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn plain_errors_have_no_code() {
        let err = anyhow::anyhow!("read graph g.json");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.message, "read graph g.json");
        assert!(cli.error_code.is_none());
    }
}
