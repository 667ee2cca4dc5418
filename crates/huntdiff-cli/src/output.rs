//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for analysts, compact text for pipes, or
//! stable JSON for scripts.
//!
//! # Output mode resolution
//!
//! Resolved once per invocation by `huntdiff_core::config`:
//! 1. `--json`
//! 2. `--format` / `FORMAT` env var (`pretty` | `text` | `json`)
//! 3. `output` in the project or user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY, [`OutputMode::Text`] if piped.

use huntdiff_core::{EngineError, ErrorCode};
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in pretty output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Analyst-oriented output (sections, aligned columns).
    Pretty,
    /// Token-efficient plain text for pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Map a normalized mode name from config resolution.
    pub fn from_resolved(raw: &str) -> Self {
        match raw {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E3001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }

    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        match code.hint() {
            Some(hint) => Self::with_details(message, hint, code.code()),
            None => Self {
                error_code: Some(code.code().to_string()),
                ..Self::new(message)
            },
        }
    }
}

impl From<&EngineError> for CliError {
    fn from(err: &EngineError) -> Self {
        Self::from_code(err.code(), err.to_string())
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode the value is serialized with `serde_json`; otherwise
/// `human_fn` writes the text for both text and pretty modes. For distinct
/// text/pretty rendering, use [`render_mode`].
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an engine error and hand back an `anyhow` error for the exit code.
pub fn fail(mode: OutputMode, err: &EngineError) -> anyhow::Error {
    let code = err.code();
    tracing::debug!(code = code.code(), kind = code.message(), "command failed");
    let cli_error = CliError::from(err);
    if let Err(render_err) = render_error(mode, &cli_error) {
        tracing::warn!("failed to render error: {render_err}");
    }
    anyhow::anyhow!("{}", cli_error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_names_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        assert_eq!(OutputMode::from_resolved("anything"), OutputMode::Pretty);
    }

    #[test]
    fn cli_error_simple() {
        let err = CliError::new("something went wrong");
        assert_eq!(err.message, "something went wrong");
        assert!(err.suggestion.is_none());
        assert!(err.error_code.is_none());
    }

    #[test]
    fn from_code_without_hint_keeps_the_code() {
        let err = CliError::from_code(ErrorCode::MissingParameter, "hunt id is required");
        assert_eq!(err.error_code.as_deref(), Some("E2001"));
        assert!(err.suggestion.is_none());

        let err = CliError::from_code(ErrorCode::DuplicateHunt, "already added");
        assert_eq!(
            err.suggestion.as_deref(),
            ErrorCode::DuplicateHunt.hint()
        );
    }

    #[test]
    fn cli_error_from_engine_error() {
        let err = EngineError::hunt_not_found("h-42");
        let cli_err = CliError::from(&err);
        assert!(cli_err.message.contains("h-42"));
        assert!(cli_err.suggestion.is_some());
        assert_eq!(cli_err.error_code.as_deref(), Some("E3001"));
    }

    #[test]
    fn error_text_includes_code_and_suggestion() {
        let err = CliError::with_details("bad input", "try again", "E2001");
        let mut buf = Vec::new();
        write_error(OutputMode::Text, &err, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "error[E2001]: bad input\n  suggestion: try again\n");
    }

    #[test]
    fn error_json_is_wrapped() {
        let err = CliError::with_details("bad input", "try again", "E2001");
        let mut buf = Vec::new();
        write_error(OutputMode::Json, &err, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["error"]["error_code"], "E2001");
        assert_eq!(value["error"]["message"], "bad input");
    }

    #[test]
    fn pretty_helpers_align() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Hunts").unwrap();
        pretty_kv(&mut buf, "samples", "12").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Hunts");
        assert_eq!(lines[1].len(), PRETTY_RULE_WIDTH);
        assert_eq!(lines[2], "samples:       12");
    }
}
