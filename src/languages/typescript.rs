// TypeScript and TSX grammars with canned queries

use super::{Preset, TreeSitterGrammar};
use crate::error::QueryError;

pub const FUNCTIONS_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @function
(method_definition
  name: (property_identifier) @name) @function
"#;

pub const CLASSES_QUERY: &str = r#"
(class_declaration
  name: (type_identifier) @name) @class
(interface_declaration
  name: (type_identifier) @name) @class
"#;

pub const CALLS_QUERY: &str = r#"
(call_expression
  function: (_) @callee
  arguments: (arguments) @arguments) @call
"#;

pub const IMPORTS_QUERY: &str = r#"
(import_statement
  source: (string) @source) @import
"#;

const PRESETS: &[Preset] = &[
    ("functions", FUNCTIONS_QUERY),
    ("classes", CLASSES_QUERY),
    ("calls", CALLS_QUERY),
    ("imports", IMPORTS_QUERY),
];

pub fn grammar() -> Result<TreeSitterGrammar, QueryError> {
    Ok(TreeSitterGrammar::new(
        "typescript",
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        tree_sitter_typescript::TYPESCRIPT_NODE_TYPES,
    )?
    .with_aliases(&["ts"])
    .with_extensions(&["ts", "mts", "cts"])
    .with_presets(PRESETS))
}

pub fn tsx_grammar() -> Result<TreeSitterGrammar, QueryError> {
    Ok(TreeSitterGrammar::new(
        "tsx",
        tree_sitter_typescript::LANGUAGE_TSX.into(),
        tree_sitter_typescript::TSX_NODE_TYPES,
    )?
    .with_extensions(&["tsx"])
    .with_presets(PRESETS))
}
