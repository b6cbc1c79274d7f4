//! Module specifier resolution.
//!
//! This module provides path → file indexing and resolution of relative
//! module specifiers the way Node-style TypeScript resolution does for files
//! inside a program. Bare package specifiers never resolve.

use crate::program::FileId;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Suffixes tried after a specifier, in order.
pub const RESOLUTION_EXTENSIONS: [&str; 5] = [".ts", ".tsx", ".d.ts", ".js", ".jsx"];

/// Index mapping normalized absolute paths to program files.
///
/// # Example
/// ```
/// # use reference_getter::resolve::module_resolver::ModuleIndex;
/// # use std::path::Path;
/// let mut index = ModuleIndex::new();
/// index.insert(Path::new("/repo/src/util.ts"), 0);
/// index.insert(Path::new("/repo/src/app.ts"), 1);
///
/// assert_eq!(index.resolve(Path::new("/repo/src/app.ts"), "./util"), Some(0));
/// assert_eq!(index.resolve(Path::new("/repo/src/app.ts"), "lodash"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    /// Maps file path → file id
    path_to_file: HashMap<PathBuf, FileId>,
}

impl ModuleIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file path → file id mapping.
    pub fn insert(&mut self, path: &Path, file: FileId) {
        self.path_to_file.insert(normalize_path(path), file);
    }

    /// File registered at exactly this path.
    pub fn get(&self, path: &Path) -> Option<FileId> {
        self.path_to_file.get(&normalize_path(path)).copied()
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.path_to_file.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.path_to_file.is_empty()
    }

    /// Resolve `specifier` as imported from `importer`.
    ///
    /// Candidates, in order: the exact path, the path plus each of
    /// [`RESOLUTION_EXTENSIONS`], a `.js`/`.jsx` suffix swapped for its
    /// TypeScript counterpart, then `index` files inside the directory.
    pub fn resolve(&self, importer: &Path, specifier: &str) -> Option<FileId> {
        if !is_relative_specifier(specifier) {
            return None;
        }

        let base = if specifier.starts_with('/') {
            normalize_path(Path::new(specifier))
        } else {
            let dir = importer.parent().unwrap_or_else(|| Path::new(""));
            normalize_path(&dir.join(specifier))
        };

        if let Some(file) = self.path_to_file.get(&base) {
            return Some(*file);
        }

        for ext in RESOLUTION_EXTENSIONS {
            if let Some(file) = self.path_to_file.get(&with_suffix(&base, ext)) {
                return Some(*file);
            }
        }

        for (js, ts) in [(".js", ".ts"), (".js", ".tsx"), (".js", ".d.ts"), (".jsx", ".tsx")] {
            if let Some(stem) = base.to_str().and_then(|s| s.strip_suffix(js)) {
                if let Some(file) = self.path_to_file.get(&PathBuf::from(format!("{}{}", stem, ts)))
                {
                    return Some(*file);
                }
            }
        }

        let index = base.join("index");
        RESOLUTION_EXTENSIONS
            .iter()
            .find_map(|ext| self.path_to_file.get(&with_suffix(&index, ext)).copied())
    }
}

/// Whether a specifier is a path rather than a package name.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Symlinks are not consulted.
///
/// # Examples
/// ```
/// # use reference_getter::resolve::module_resolver::normalize_path;
/// # use std::path::{Path, PathBuf};
/// assert_eq!(
///     normalize_path(Path::new("/repo/src/../lib/./a.ts")),
///     PathBuf::from("/repo/lib/a.ts")
/// );
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(paths: &[&str]) -> ModuleIndex {
        let mut index = ModuleIndex::new();
        for (id, path) in paths.iter().enumerate() {
            index.insert(Path::new(path), id);
        }
        index
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/a/./b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_extension_probing_order() {
        let idx = index(&["/r/a.js", "/r/a.ts"]);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./a"), Some(1));
    }

    #[test]
    fn test_exact_path_wins() {
        let idx = index(&["/r/a.js", "/r/a.ts"]);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./a.js"), Some(0));
    }

    #[test]
    fn test_js_specifier_maps_to_ts_source() {
        let idx = index(&["/r/lib/util.ts", "/r/view.tsx"]);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./lib/util.js"), Some(0));
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./view.jsx"), Some(1));
    }

    #[test]
    fn test_declaration_files() {
        let idx = index(&["/r/types.d.ts"]);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./types"), Some(0));
    }

    #[test]
    fn test_directory_index() {
        let idx = index(&["/r/components/index.tsx"]);
        assert_eq!(idx.resolve(Path::new("/r/src/app.tsx"), "../components"), Some(0));
    }

    #[test]
    fn test_parent_directory_specifier() {
        let idx = index(&["/r/index.js", "/r/sub/a.js"]);
        assert_eq!(idx.resolve(Path::new("/r/sub/a.js"), ".."), Some(0));
    }

    #[test]
    fn test_bare_and_missing_specifiers() {
        let idx = index(&["/r/react.ts"]);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "react"), None);
        assert_eq!(idx.resolve(Path::new("/r/main.ts"), "./missing"), None);
    }
}
