//! Reference getter error types.
//!
//! All errors are typed and provide root cause information.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for reference lookups.
#[derive(Error, Debug)]
pub enum RefError {
    /// The `file:line:column` locator did not match the expected shape.
    #[error("Invalid file location format. Expected: path/to/file:line:column")]
    InvalidLocator {
        /// The rejected input.
        input: String,
    },

    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Tree-sitter parsing error.
    #[error("Parse error in {file}: {message}")]
    Parse {
        /// The file that failed to parse.
        file: PathBuf,
        /// The parse error message.
        message: String,
    },

    /// The requested file is not part of the loaded program.
    #[error("File not found in program: {}", .0.display())]
    FileNotInProgram(PathBuf),

    /// No syntax node covers the requested position.
    #[error("No node found at position {line}:{column}")]
    NoNodeAtPosition {
        /// Line number (1-based).
        line: usize,
        /// Column number (1-based).
        column: usize,
    },

    /// Project configuration could not be loaded.
    #[error("Invalid project config {path}: {message}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// UTF-8 validation error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl RefError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RefError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable identifier for the error kind (used by the JSON reporter).
    pub fn kind(&self) -> &'static str {
        match self {
            RefError::InvalidLocator { .. } => "InvalidLocator",
            RefError::Io { .. } => "Io",
            RefError::Parse { .. } => "Parse",
            RefError::FileNotInProgram(_) => "FileNotInProgram",
            RefError::NoNodeAtPosition { .. } => "NoNodeAtPosition",
            RefError::Config { .. } => "Config",
            RefError::Utf8(_) => "Utf8",
            RefError::Json(_) => "Json",
            RefError::Other(_) => "Other",
        }
    }

    /// File associated with the error, if any.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            RefError::Io { path, .. } | RefError::Config { path, .. } => Some(path),
            RefError::Parse { file, .. } => Some(file),
            RefError::FileNotInProgram(path) => Some(path),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RefError {
    fn from(err: std::io::Error) -> Self {
        RefError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

/// Result type alias for reference lookups.
pub type Result<T> = std::result::Result<T, RefError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_node_message_format() {
        let err = RefError::NoNodeAtPosition { line: 3, column: 7 };
        assert_eq!(err.to_string(), "No node found at position 3:7");
        assert_eq!(err.kind(), "NoNodeAtPosition");
    }

    #[test]
    fn test_invalid_locator_message() {
        let err = RefError::InvalidLocator {
            input: "nope".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid file location format. Expected: path/to/file:line:column"
        );
    }

    #[test]
    fn test_file_path_is_exposed() {
        let err = RefError::FileNotInProgram(PathBuf::from("/repo/missing.ts"));
        assert_eq!(err.file_path(), Some(Path::new("/repo/missing.ts")));
        assert!(err.to_string().contains("/repo/missing.ts"));
    }
}
