//! `file:line:column` locator parsing.

use crate::error::{RefError, Result};
use std::path::PathBuf;

/// A 1-based position inside a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// Path as written in the locator (usually relative to the repository).
    pub file_path: PathBuf,

    /// Line number (1-based).
    pub line: usize,

    /// Column number (1-based, UTF-16 code units).
    pub column: usize,
}

/// Parse a `path:line:column` locator.
///
/// The path is greedy: only the last two colon-separated groups are taken as
/// line and column, so `C:/src/a.ts:3:4` keeps `C:/src/a.ts` as the path.
/// Line and column must both be at least 1.
///
/// # Examples
///
/// ```
/// # use reference_getter::locator::parse_file_location;
/// let pos = parse_file_location("src/a.ts:10:5")?;
/// assert_eq!(pos.line, 10);
/// assert_eq!(pos.column, 5);
/// # Ok::<(), reference_getter::RefError>(())
/// ```
pub fn parse_file_location(input: &str) -> Result<SourcePosition> {
    let invalid = || RefError::InvalidLocator {
        input: input.to_string(),
    };

    let mut parts = input.rsplitn(3, ':');
    let column = parts.next().ok_or_else(invalid)?;
    let line = parts.next().ok_or_else(invalid)?;
    let path = parts.next().ok_or_else(invalid)?;

    if path.is_empty() || path.contains(['\n', '\r']) {
        return Err(invalid());
    }

    let line = parse_number(line).ok_or_else(invalid)?;
    let column = parse_number(column).ok_or_else(invalid)?;

    Ok(SourcePosition {
        file_path: PathBuf::from(path),
        line,
        column,
    })
}

/// ASCII digits only, no sign, no zero.
fn parse_number(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok().filter(|n| *n >= 1)
}
