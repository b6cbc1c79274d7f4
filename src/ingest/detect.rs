//! Picking a tree-sitter dialect for a source file.
//!
//! `.ts` and `.tsx` get the TypeScript grammars; `.js` and `.jsx` share the
//! JavaScript grammar, which parses JSX. The file's contents are never
//! consulted, and any other extension yields `None`.

use std::path::Path;

/// Source dialects understood by the reference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// JavaScript (.js, .jsx), JSX included.
    JavaScript,
    /// TypeScript (.ts)
    TypeScript,
    /// TypeScript with JSX (.tsx)
    Tsx,
}

impl Language {
    /// Short name used in parser error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
        }
    }

    /// Tree-sitter grammar for this dialect.
    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::JavaScript => tree_sitter_javascript::language(),
            Language::TypeScript => tree_sitter_typescript::language_typescript(),
            Language::Tsx => tree_sitter_typescript::language_tsx(),
        }
    }
}

/// Extensions collected during discovery, without the leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

/// Detect the source dialect from a file path.
///
/// # Examples
///
/// ```
/// # use reference_getter::ingest::detect::{detect_language, Language};
/// # use std::path::Path;
/// assert_eq!(detect_language(Path::new("app.tsx")), Some(Language::Tsx));
/// assert_eq!(detect_language(Path::new("index.js")), Some(Language::JavaScript));
/// assert_eq!(detect_language(Path::new("README.md")), None);
/// ```
pub fn detect_language(path: &Path) -> Option<Language> {
    let extension = path.extension()?.to_str()?;

    // extensions match case-sensitively
    let language = match extension {
        "js" | "jsx" => Language::JavaScript,
        "ts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        _ => return None,
    };

    Some(language)
}
