//! Mapping a 1-based line/column position to a syntax node.

use crate::error::{RefError, Result};
use crate::ingest::SourceFile;
use tree_sitter::Node;

/// Smallest descendant of `root` whose range `[start, end)` contains `offset`.
///
/// The root itself never counts: an offset that only the root covers (leading
/// or trailing whitespace, blank lines between statements) yields `None`.
pub fn node_at_offset(root: Node<'_>, offset: usize) -> Option<Node<'_>> {
    let mut node = root;
    loop {
        let mut cursor = node.walk();
        let child = node
            .children(&mut cursor)
            .find(|c| c.start_byte() <= offset && offset < c.end_byte());
        match child {
            Some(child) => node = child,
            None => break,
        }
    }
    (node != root).then_some(node)
}

/// Resolve a 1-based `line:column` position in `file` to a syntax node.
pub fn node_at_position(file: &SourceFile, line: usize, column: usize) -> Result<Node<'_>> {
    let not_found = || RefError::NoNodeAtPosition { line, column };
    let offset = file.byte_offset(line, column).ok_or_else(not_found)?;
    node_at_offset(file.root(), offset).ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_source;
    use std::path::Path;

    fn parse(name: &str, text: &str) -> SourceFile {
        parse_source(Path::new(name), text.to_string()).unwrap()
    }

    #[test]
    fn test_identifier_at_position() {
        let file = parse("a.ts", "export function f(){}\n");
        let node = node_at_position(&file, 1, 17).unwrap();
        assert_eq!(node.kind(), "identifier");
        assert_eq!(file.node_text(node), "f");
    }

    #[test]
    fn test_end_of_token_is_exclusive() {
        let file = parse("a.ts", "let abc = 1;\n");
        // column 8 is the space after `abc`, inside the declarator
        let node = node_at_position(&file, 1, 8).unwrap();
        assert_ne!(file.node_text(node), "abc");
        let node = node_at_position(&file, 1, 7).unwrap();
        assert_eq!(file.node_text(node), "abc");
    }

    #[test]
    fn test_blank_line_has_no_node() {
        let file = parse("a.ts", "let a = 1;\n\nlet b = 2;\n");
        let err = node_at_position(&file, 2, 1).unwrap_err();
        assert_eq!(err.to_string(), "No node found at position 2:1");
    }

    #[test]
    fn test_leading_whitespace_has_no_node() {
        let file = parse("a.js", "    foo();\n");
        assert!(node_at_position(&file, 1, 2).is_err());
        assert!(node_at_position(&file, 1, 5).is_ok());
    }

    #[test]
    fn test_position_outside_text() {
        let file = parse("a.js", "foo();\n");
        assert!(matches!(
            node_at_position(&file, 9, 1),
            Err(RefError::NoNodeAtPosition { line: 9, column: 1 })
        ));
        assert!(node_at_position(&file, 1, 40).is_err());
    }
}
