//! Source file discovery.
//!
//! Walks a repository and collects JavaScript/TypeScript files, pruning
//! dependency caches, VCS metadata and build output.

use crate::error::{RefError, Result};
use crate::ingest::detect::SUPPORTED_EXTENSIONS;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names that are never entered.
pub const EXCLUDED_DIRS: [&str; 3] = ["node_modules", ".git", "dist"];

/// Rules deciding which paths are collected.
#[derive(Debug, Clone)]
pub struct DiscoveryRules {
    /// Extensions (without dot) that are collected.
    pub extensions: Vec<String>,

    /// Directory names that are pruned wherever they appear.
    pub excluded_dirs: Vec<String>,

    /// Extra glob patterns matched against repo-relative paths.
    pub exclude_patterns: Vec<glob::Pattern>,

    /// When non-empty, files must match one of these repo-relative globs.
    pub include_patterns: Vec<glob::Pattern>,
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

impl DiscoveryRules {
    /// Compile user supplied exclusion globs.
    pub fn with_exclude_globs<S: AsRef<str>>(mut self, globs: &[S]) -> Result<Self> {
        self.exclude_patterns.extend(compile_globs(globs, "exclude")?);
        Ok(self)
    }

    /// Restrict collected files to the given globs.
    pub fn with_include_globs<S: AsRef<str>>(mut self, globs: &[S]) -> Result<Self> {
        self.include_patterns.extend(compile_globs(globs, "include")?);
        Ok(self)
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    fn has_supported_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    fn matches_pattern(&self, root: &Path, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let relative = relative_slash_path(root, path);
        self.exclude_patterns.iter().any(|p| p.matches(&relative))
    }

    fn is_included(&self, root: &Path, path: &Path) -> bool {
        if self.include_patterns.is_empty() {
            return true;
        }
        let relative = relative_slash_path(root, path);
        self.include_patterns.iter().any(|p| p.matches(&relative))
    }
}

fn compile_globs<S: AsRef<str>>(globs: &[S], what: &str) -> Result<Vec<glob::Pattern>> {
    globs
        .iter()
        .map(|raw| {
            glob::Pattern::new(raw.as_ref()).map_err(|e| {
                RefError::Other(format!("Invalid {} pattern '{}': {}", what, raw.as_ref(), e))
            })
        })
        .collect()
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Recursively collect source files under `root`.
///
/// Entries are visited in file-name order so the result is stable across
/// filesystems. Symlinks are not followed. Any walk error is fatal.
pub fn discover_source_files(root: &Path, rules: &DiscoveryRules) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_pruned(root, rules, entry));

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() || !rules.has_supported_extension(entry.path()) {
            continue;
        }
        let path = entry.into_path();
        if rules.matches_pattern(root, &path) || !rules.is_included(root, &path) {
            debug!("excluded file {}", path.display());
            continue;
        }
        files.push(path);
    }

    debug!("discovered {} source files under {}", files.len(), root.display());
    Ok(files)
}

fn is_pruned(root: &Path, rules: &DiscoveryRules, entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    if rules.is_excluded_dir(&entry.file_name().to_string_lossy()) {
        return true;
    }
    if rules.matches_pattern(root, entry.path()) {
        debug!("excluded directory {}", entry.path().display());
        return true;
    }
    false
}

fn walk_error(err: walkdir::Error) -> RefError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => RefError::io(path, source),
        None => RefError::Other(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collects_supported_extensions_only() {
        let dir = TempDir::new().unwrap();
        for rel in ["a.ts", "b.tsx", "c.js", "d.jsx", "e.json", "f.mjs", "g.md"] {
            touch(dir.path(), rel);
        }

        let files = discover_source_files(dir.path(), &DiscoveryRules::default()).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["a.ts", "b.tsx", "c.js", "d.jsx"]);
    }

    #[test]
    fn test_prunes_excluded_directories_at_any_depth() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/index.ts");
        touch(dir.path(), "node_modules/lib/index.js");
        touch(dir.path(), "packages/app/node_modules/dep/index.js");
        touch(dir.path(), ".git/hooks/pre-commit.js");
        touch(dir.path(), "dist/bundle.js");
        touch(dir.path(), "packages/app/dist/out.js");
        touch(dir.path(), "packages/app/src/main.tsx");

        let files = discover_source_files(dir.path(), &DiscoveryRules::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &files),
            vec!["packages/app/src/main.tsx", "src/index.ts"]
        );
    }

    #[test]
    fn test_directory_named_like_excluded_file_is_kept() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "distribution/a.ts");
        touch(dir.path(), "src/dist.ts");

        let files = discover_source_files(dir.path(), &DiscoveryRules::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &files),
            vec!["distribution/a.ts", "src/dist.ts"]
        );
    }

    #[test]
    fn test_exclude_globs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a.ts");
        touch(dir.path(), "src/a.test.ts");
        touch(dir.path(), "fixtures/data/x.js");

        let rules = DiscoveryRules::default()
            .with_exclude_globs(&["**/*.test.ts", "fixtures"])
            .unwrap();
        let files = discover_source_files(dir.path(), &rules).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["src/a.ts"]);
    }

    #[test]
    fn test_include_globs_restrict_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.ts");
        touch(dir.path(), "lib/b.js");
        touch(dir.path(), "lib/c.tsx");

        let rules = DiscoveryRules::default()
            .with_include_globs(&["**/*.ts", "**/*.tsx"])
            .unwrap();
        let files = discover_source_files(dir.path(), &rules).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["a.ts", "lib/c.tsx"]);
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let err = DiscoveryRules::default()
            .with_exclude_globs(&["[unclosed"])
            .unwrap_err();
        assert!(err.to_string().contains("Invalid exclude pattern"));
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_walked() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "dist/src/a.ts");
        touch(dir.path(), "dist/dist/b.ts");

        let root = dir.path().join("dist");
        let files = discover_source_files(&root, &DiscoveryRules::default()).unwrap();
        assert_eq!(relative(&root, &files), vec!["src/a.ts"]);
    }

    #[test]
    fn test_order_is_depth_first_by_name() {
        let dir = TempDir::new().unwrap();
        for rel in ["b.ts", "a/z.ts", "a/b/c.ts", "c.ts", "a.ts"] {
            touch(dir.path(), rel);
        }

        let files = discover_source_files(dir.path(), &DiscoveryRules::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &files),
            vec!["a/b/c.ts", "a/z.ts", "a.ts", "b.ts", "c.ts"]
        );
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = discover_source_files(&missing, &DiscoveryRules::default()).unwrap_err();
        match err {
            RefError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
