use crate::error::QueryError;
use crate::languages::Grammar;
use crate::tree::{NodeSpec, Position, SyntaxTree, TreeBuilder};
use tracing::{debug, warn};
use tree_sitter::{Parser, Point, Tree};

/// Parse source text with the given grammar.
///
/// Syntax errors do not fail the parse: they show up as `ERROR` (or missing)
/// nodes in the returned tree.
pub fn parse<'s>(source: &'s str, grammar: &dyn Grammar) -> Result<SyntaxTree<'s>, QueryError> {
    let tree = grammar.parse(source)?;
    debug!(
        language = grammar.name(),
        bytes = source.len(),
        nodes = tree.len(),
        "parsed source"
    );
    if tree.has_error() {
        warn!(
            language = grammar.name(),
            errors = tree.error_nodes().len(),
            "source contains syntax errors, matching against a partial tree"
        );
    }
    Ok(tree)
}

/// Parse with a tree-sitter language and convert to an owned [`SyntaxTree`].
pub fn parse_tree_sitter<'s>(
    source: &'s str,
    language: &tree_sitter::Language,
    name: &str,
) -> Result<SyntaxTree<'s>, QueryError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| QueryError::parse_failure(name, format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| QueryError::parse_failure(name, "parser produced no tree"))?;

    convert(source, &tree)
        .ok_or_else(|| QueryError::parse_failure(name, "syntax tree spans are inconsistent"))
}

fn position(point: Point) -> Position {
    Position::new(point.row, point.column)
}

/// Walk the tree-sitter tree with a cursor, feeding the builder in pre-order.
fn convert<'s>(source: &'s str, tree: &Tree) -> Option<SyntaxTree<'s>> {
    let mut builder = TreeBuilder::new(source);
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        builder.open(NodeSpec {
            kind: node.kind(),
            named: node.is_named(),
            field: cursor.field_name(),
            is_error: node.is_error(),
            is_missing: node.is_missing(),
            start_byte: node.start_byte(),
            start: position(node.start_position()),
        });
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            let done = cursor.node();
            builder.close(done.end_byte(), position(done.end_position()));
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
        }
    }
}
