// JavaScript grammar (also used for JSX) and canned queries

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
  name: (identifier) @name) @class
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
        "javascript",
        tree_sitter_javascript::LANGUAGE.into(),
        tree_sitter_javascript::NODE_TYPES,
    )?
    .with_aliases(&["js", "jsx"])
    .with_extensions(&["js", "jsx", "mjs", "cjs"])
    .with_presets(PRESETS))
}
