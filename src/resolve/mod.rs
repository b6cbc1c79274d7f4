//! Symbol resolution across the files of a program.
//!
//! - [`module_resolver`]: module specifiers to program files.
//! - [`engine`]: linking and the find-references query.
//! - [`position`]: line/column to syntax node.
//! - [`references`]: grouped references to repository-relative paths.

pub mod engine;
pub mod module_resolver;
pub mod position;
pub mod references;

pub use engine::{find_references, Reference, ReferencedSymbol};
pub use position::node_at_position;
pub use references::{collect_reference_paths, ReferenceSet};
