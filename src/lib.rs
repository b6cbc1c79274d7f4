//! reference_getter: find every JavaScript/TypeScript file that references a symbol.
//!
//! Given a repository root and a `file:line:column` position, the library
//! discovers the repository's source files, parses them with tree-sitter, binds
//! scopes and module links, and reports every file containing a reference to the
//! symbol at that position.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod binder;
pub mod cli;
pub mod discover;
pub mod error;
pub mod ingest;
pub mod locator;
pub mod lookup;
pub mod program;
pub mod report;
pub mod resolve;

/// Re-export common error types for convenience.
pub use error::{RefError, Result};

/// Re-export the end-to-end lookup.
pub use lookup::{run_lookup, LookupOptions};

/// reference_getter version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
