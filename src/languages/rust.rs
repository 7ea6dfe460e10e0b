// Rust grammar and canned queries

use super::{Preset, TreeSitterGrammar};
use crate::error::QueryError;

pub const FUNCTIONS_QUERY: &str = r#"
(function_item
  name: (identifier) @name) @function
"#;

/// Structs, enums and traits; one pattern each so every match carries `@name`.
pub const TYPES_QUERY: &str = r#"
(struct_item name: (type_identifier) @name) @type
(enum_item name: (type_identifier) @name) @type
(trait_item name: (type_identifier) @name) @type
"#;

pub const CALLS_QUERY: &str = r#"
(call_expression
  function: (_) @callee
  arguments: (arguments) @arguments) @call
"#;

pub const IMPORTS_QUERY: &str = r#"
(use_declaration
  argument: (_) @path) @import
"#;

const PRESETS: &[Preset] = &[
    ("functions", FUNCTIONS_QUERY),
    ("types", TYPES_QUERY),
    ("calls", CALLS_QUERY),
    ("imports", IMPORTS_QUERY),
];

pub fn grammar() -> Result<TreeSitterGrammar, QueryError> {
    Ok(TreeSitterGrammar::new(
        "rust",
        tree_sitter_rust::LANGUAGE.into(),
        tree_sitter_rust::NODE_TYPES,
    )?
    .with_aliases(&["rs"])
    .with_extensions(&["rs"])
    .with_presets(PRESETS))
}
