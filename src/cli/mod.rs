//! Command-line interface for reference_getter.
//!
//! This module handles argument parsing and output payloads only.
//! NO lookup logic is performed here.

use crate::error::RefError;
use crate::resolve::ReferenceSet;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

/// Usage line printed when positional arguments are missing.
pub const USAGE: &str = "Usage: reference_getter <repo_path> <file_path:line:column>";

/// reference_getter: list the files that reference the symbol at a position.
#[derive(Parser, Debug)]
#[command(name = "reference_getter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository root to scan.
    pub repo_path: Option<PathBuf>,

    /// Symbol position as `path/to/file:line:column` (1-based).
    pub location: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a JSON payload instead of one path per line.
    #[arg(long)]
    pub json: bool,

    /// Project configuration file (tsconfig-style JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip files or directories matching this repo-relative glob.
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
}

impl Cli {
    /// Both positional arguments, or `None` when either is missing or empty.
    pub fn positionals(&self) -> Option<(&PathBuf, &str)> {
        let repo = self.repo_path.as_ref().filter(|p| !p.as_os_str().is_empty())?;
        let location = self.location.as_deref().filter(|l| !l.is_empty())?;
        Some((repo, location))
    }
}

/// Parse command-line arguments.
///
/// Returns clap's error unchanged so the caller decides how to exit; help and
/// version requests surface as errors too.
pub fn try_parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload<'a> {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Referencing files, relative to the repository root.
    pub references: &'a ReferenceSet,
}

impl<'a> CliSuccessPayload<'a> {
    /// Construct a payload for a finished lookup.
    pub fn new(references: &'a ReferenceSet) -> Self {
        Self {
            status: "ok",
            references,
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (NoNodeAtPosition, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a RefError instance.
    pub fn from_error(error: &RefError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positionals_and_flags() {
        let cli = try_parse_args([
            "reference_getter",
            "--json",
            "--exclude",
            "a/**",
            "--exclude",
            "b",
            "repo",
            "src/a.ts:1:2",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(!cli.verbose);
        assert_eq!(cli.exclude, vec!["a/**", "b"]);
        let (repo, location) = cli.positionals().unwrap();
        assert_eq!(repo, &PathBuf::from("repo"));
        assert_eq!(location, "src/a.ts:1:2");
    }

    #[test]
    fn test_missing_positionals_parse_but_are_reported() {
        let cli = try_parse_args(["reference_getter", "repo"]).unwrap();
        assert!(cli.positionals().is_none());

        let cli = try_parse_args(["reference_getter", "repo", ""]).unwrap();
        assert!(cli.positionals().is_none());
    }

    #[test]
    fn test_error_payload_shape() {
        let err = RefError::NoNodeAtPosition { line: 4, column: 2 };
        let value = serde_json::to_value(CliErrorPayload::from_error(&err)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "NoNodeAtPosition");
        assert_eq!(value["error"]["message"], "No node found at position 4:2");
        assert!(value["error"].get("file").is_none());
    }

    #[test]
    fn test_success_payload_shape() {
        let mut set = ReferenceSet::new();
        set.insert("a.ts");
        set.insert("lib/b.ts");
        let value = serde_json::to_value(CliSuccessPayload::new(&set)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "ok", "references": ["a.ts", "lib/b.ts"]})
        );
    }
}
