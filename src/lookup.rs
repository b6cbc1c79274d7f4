//! End-to-end reference lookup.
//!
//! Ties the pipeline together: locator → discovery → program → position →
//! references → relative paths.

use crate::discover::discover_source_files;
use crate::error::{RefError, Result};
use crate::locator::parse_file_location;
use crate::program::config::ProjectConfig;
use crate::program::ProgramBuilder;
use crate::resolve::module_resolver::normalize_path;
use crate::resolve::{collect_reference_paths, node_at_position, ReferenceSet};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Options for [`run_lookup`].
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Project configuration.
    pub config: ProjectConfig,

    /// Extra repo-relative globs to skip during discovery.
    pub exclude: Vec<String>,
}

/// Find the files referencing the symbol at `location` inside `repo_path`.
///
/// `location` has the form `path/to/file:line:column`, with the path relative
/// to `repo_path` (or absolute) and line/column 1-based.
pub fn run_lookup(
    repo_path: &Path,
    location: &str,
    options: &LookupOptions,
) -> Result<ReferenceSet> {
    let position = parse_file_location(location)?;
    let root = absolute_path(repo_path)?;
    let file_path = normalize_path(&root.join(&position.file_path));
    debug!(
        "looking up {}:{}:{} under {}",
        file_path.display(),
        position.line,
        position.column,
        root.display()
    );

    let rules = options
        .config
        .discovery_rules()?
        .with_exclude_globs(&options.exclude)?;
    let files = discover_source_files(&root, &rules)?;

    let mut builder = ProgramBuilder::new(options.config.clone());
    for path in &files {
        if let Err(e) = builder.add_source_file_at_path(path) {
            debug!("skipping {}: {}", path.display(), e);
        }
    }
    let program = builder.build();

    let file_id = program
        .file_id(&file_path)
        .ok_or_else(|| RefError::FileNotInProgram(file_path.clone()))?;
    let source = &program.file(file_id).source;
    let node = node_at_position(source, position.line, position.column)?;
    debug!("node at position: {} ({})", node.kind(), source.node_text(node));

    let groups = program.find_references(file_id, node);
    let set = collect_reference_paths(&groups, &root);
    info!("{} referencing files", set.len());
    Ok(set)
}

/// Make `path` absolute against the current directory, lexically normalized.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().map_err(|e| RefError::io(".", e))?;
    Ok(normalize_path(&cwd.join(path)))
}
