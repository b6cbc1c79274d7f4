//! Reference aggregation into repository-relative paths.
//!
//! Flattens grouped references into the de-duplicated set of file paths the
//! CLI prints, in program file order.

use super::engine::{Reference, ReferencedSymbol};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Ordered set of repository-relative paths. Iteration follows first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceSet {
    entries: Vec<String>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl ReferenceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path; returns false when it was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.entries.push(path);
        true
    }

    /// Whether `path` is present.
    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths in insertion order.
    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

/// Flatten every group's references into paths relative to `root`.
///
/// Paths come out in program file order (discovery order), whatever order
/// the groups were built in.
pub fn collect_reference_paths(groups: &[ReferencedSymbol], root: &Path) -> ReferenceSet {
    let mut references: Vec<&Reference> = groups.iter().flat_map(|g| &g.references).collect();
    references.sort_by_key(|r| (r.file, r.span.start));

    let mut set = ReferenceSet::new();
    for reference in references {
        let relative = relative_path(root, &reference.path);
        set.insert(relative.to_string_lossy().to_string());
    }
    set
}

/// Lexical path from `base` to `path`, both absolute and normalized.
///
/// # Examples
/// ```
/// # use reference_getter::resolve::references::relative_path;
/// # use std::path::{Path, PathBuf};
/// assert_eq!(
///     relative_path(Path::new("/repo"), Path::new("/repo/src/a.ts")),
///     PathBuf::from("src/a.ts")
/// );
/// assert_eq!(
///     relative_path(Path::new("/repo/app"), Path::new("/repo/lib/b.ts")),
///     PathBuf::from("../lib/b.ts")
/// );
/// ```
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix(base) {
        return stripped.to_path_buf();
    }

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let common = base_parts
        .iter()
        .zip(path_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Span, SymbolKind};
    use crate::program::SymbolId;

    fn reference(path: &str) -> Reference {
        reference_in(0, path)
    }

    fn reference_in(file: usize, path: &str) -> Reference {
        Reference {
            file,
            path: PathBuf::from(path),
            span: Span { start: 0, end: 1 },
            line: 1,
            column: 1,
            is_definition: false,
        }
    }

    fn group(paths: &[&str]) -> ReferencedSymbol {
        ReferencedSymbol {
            definition: SymbolId { file: 0, index: 0 },
            name: "x".to_string(),
            kind: SymbolKind::Variable,
            declaration: None,
            references: paths.iter().map(|p| reference(p)).collect(),
        }
    }

    #[test]
    fn test_set_keeps_first_seen_order() {
        let mut set = ReferenceSet::new();
        assert!(set.insert("b.ts"));
        assert!(set.insert("a.ts"));
        assert!(!set.insert("b.ts"));
        assert_eq!(set.into_vec(), vec!["b.ts", "a.ts"]);
    }

    #[test]
    fn test_flattens_groups_and_deduplicates() {
        let groups = vec![
            group(&["/repo/a.ts", "/repo/a.ts"]),
            group(&["/repo/src/b.ts", "/repo/a.ts"]),
        ];
        let set = collect_reference_paths(&groups, Path::new("/repo"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a.ts", "src/b.ts"]);
    }

    #[test]
    fn test_paths_follow_file_order_across_groups() {
        // the alias group is built before the declaring file's group
        let alias = ReferencedSymbol {
            definition: SymbolId { file: 0, index: 3 },
            name: "x".to_string(),
            kind: SymbolKind::Variable,
            declaration: None,
            references: vec![reference_in(2, "/repo/c.ts"), reference_in(0, "/repo/a.ts")],
        };
        let declared = ReferencedSymbol {
            definition: SymbolId { file: 1, index: 0 },
            name: "x".to_string(),
            kind: SymbolKind::Variable,
            declaration: None,
            references: vec![reference_in(1, "/repo/b.ts")],
        };
        let set = collect_reference_paths(&[alias, declared], Path::new("/repo"));
        assert_eq!(set.into_vec(), vec!["a.ts", "b.ts", "c.ts"]);
    }

    #[test]
    fn test_empty_groups_give_empty_set() {
        let set = collect_reference_paths(&[group(&[])], Path::new("/repo"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut set = ReferenceSet::new();
        set.insert("a.ts");
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a.ts"]"#);
    }
}
