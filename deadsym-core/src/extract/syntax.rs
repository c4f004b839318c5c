//! Shared tree-sitter plumbing for the grammar-backed extractors.

use tree_sitter::{Language as Grammar, Node, Parser, Tree};

use crate::error::{DeadsymError, DeadsymResult};
use crate::model::Span;

/// Parse `source` and reject trees containing ERROR or MISSING nodes.
pub(crate) fn parse_tree(grammar: &Grammar, filename: &str, source: &str) -> DeadsymResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| DeadsymError::internal(format!("Failed to set language: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| DeadsymError::parse(filename, "parser produced no tree"))?;

    if let Some(bad) = first_error(tree.root_node()) {
        let at = bad.start_position();
        return Err(DeadsymError::parse_at(
            filename,
            format!("unexpected {}", if bad.is_missing() { "end of input" } else { "syntax" }),
            at.row + 1,
            at.column + 1,
        ));
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

pub(crate) fn text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

/// 1-based start line.
pub(crate) fn line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// 1-based end line.
pub(crate) fn end_line(node: Node<'_>) -> usize {
    node.end_position().row + 1
}

pub(crate) fn span(node: Node<'_>) -> Span {
    let (start, end) = (node.start_position(), node.end_position());
    Span::new(start.row + 1, start.column, end.row + 1, end.column)
}

pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}
