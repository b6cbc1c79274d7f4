//! Source loading and tree-sitter parsing.
//!
//! A [`SourceFile`] owns the text, the syntax tree and a rope used for
//! line/column conversions. Columns follow the TypeScript convention of
//! counting UTF-16 code units.

pub mod detect;

use crate::error::{RefError, Result};
use detect::{detect_language, Language};
use ropey::Rope;
use std::path::{Path, PathBuf};

/// A parsed source file.
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,

    /// Dialect the file was parsed with.
    pub language: Language,

    /// Full source text (UTF-8, byte order mark removed).
    pub text: String,

    /// Tree-sitter syntax tree.
    pub tree: tree_sitter::Tree,

    rope: Rope,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("len", &self.text.len())
            .finish()
    }
}

impl SourceFile {
    /// Source text as bytes, for `Node::utf8_text`.
    pub fn source(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Root node of the syntax tree.
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by a node.
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        &self.text[node.start_byte()..node.end_byte()]
    }

    /// Convert a 1-based (line, column) pair into a byte offset.
    ///
    /// The column counts UTF-16 code units from the start of the line. Returns
    /// `None` when the line does not exist or the column runs past the end of
    /// the line (into the next one).
    pub fn byte_offset(&self, line: usize, column: usize) -> Option<usize> {
        let line_idx = line.checked_sub(1)?;
        let column_idx = column.checked_sub(1)?;
        let line_count = self.rope.len_lines();
        if line_idx >= line_count {
            return None;
        }

        let is_last_line = line_idx + 1 == line_count;
        let line_start = self.rope.line_to_char(line_idx);
        let line_end = if is_last_line {
            self.rope.len_chars()
        } else {
            self.rope.line_to_char(line_idx + 1)
        };

        let start_cu = self.rope.char_to_utf16_cu(line_start);
        let end_cu = self.rope.char_to_utf16_cu(line_end);
        let target_cu = start_cu.checked_add(column_idx)?;
        if target_cu > end_cu || (!is_last_line && target_cu == end_cu) {
            return None;
        }

        let char_idx = self.rope.utf16_cu_to_char(target_cu);
        Some(self.rope.char_to_byte(char_idx))
    }

    /// Convert a byte offset into a 1-based (line, column) pair.
    pub fn line_column(&self, byte: usize) -> (usize, usize) {
        let byte = byte.min(self.text.len());
        let char_idx = self.rope.byte_to_char(byte);
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        let column =
            self.rope.char_to_utf16_cu(char_idx) - self.rope.char_to_utf16_cu(line_start);
        (line + 1, column + 1)
    }
}

/// Parse source text that is already in memory.
pub fn parse_source(path: &Path, text: String) -> Result<SourceFile> {
    let language = detect_language(path).ok_or_else(|| RefError::Parse {
        file: path.to_path_buf(),
        message: "Unsupported file extension".to_string(),
    })?;

    let text = match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    };

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| RefError::Parse {
            file: path.to_path_buf(),
            message: format!("Failed to set {} language: {:?}", language.as_str(), e),
        })?;

    let tree = parser
        .parse(text.as_bytes(), None)
        .ok_or_else(|| RefError::Parse {
            file: path.to_path_buf(),
            message: "Parse failed - no tree returned".to_string(),
        })?;

    let rope = Rope::from_str(&text);

    Ok(SourceFile {
        path: path.to_path_buf(),
        language,
        text,
        tree,
        rope,
    })
}

/// Read and parse a file from disk.
pub fn load_source_file(path: &Path) -> Result<SourceFile> {
    let bytes = std::fs::read(path).map_err(|e| RefError::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| RefError::Utf8(e.utf8_error()))?;
    parse_source(path, text)
}
