//! Output rendering for lookup results and errors.

use crate::cli::{CliErrorPayload, CliSuccessPayload};
use crate::error::{RefError, Result};
use crate::resolve::ReferenceSet;
use std::io::Write;

/// Write one path per line, in set order.
pub fn write_references<W: Write>(out: &mut W, references: &ReferenceSet) -> Result<()> {
    for path in references.iter() {
        writeln!(out, "{}", path)?;
    }
    Ok(())
}

/// Write the JSON success payload followed by a newline.
pub fn write_references_json<W: Write>(out: &mut W, references: &ReferenceSet) -> Result<()> {
    serde_json::to_writer(&mut *out, &CliSuccessPayload::new(references))?;
    writeln!(out)?;
    Ok(())
}

/// Write the single `Error: <message>` line.
pub fn write_error<W: Write>(out: &mut W, error: &RefError) -> Result<()> {
    writeln!(out, "Error: {}", error)?;
    Ok(())
}

/// Write the JSON error payload followed by a newline.
pub fn write_error_json<W: Write>(out: &mut W, error: &RefError) -> Result<()> {
    serde_json::to_writer(&mut *out, &CliErrorPayload::from_error(error))?;
    writeln!(out)?;
    Ok(())
}
