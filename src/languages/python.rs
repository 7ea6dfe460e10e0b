// Python grammar and canned queries

use super::{Preset, TreeSitterGrammar};
use crate::error::QueryError;

pub const FUNCTIONS_QUERY: &str = r#"
(function_definition
  name: (identifier) @name
  body: (block) @body) @function
"#;

pub const CLASSES_QUERY: &str = r#"
(class_definition
  name: (identifier) @name) @class
"#;

pub const CALLS_QUERY: &str = r#"
(call
  function: (_) @callee
  arguments: (argument_list) @arguments) @call
"#;

pub const IMPORTS_QUERY: &str = r#"
(import_statement) @import
(import_from_statement
  module_name: (_) @module) @import
"#;

const PRESETS: &[Preset] = &[
    ("functions", FUNCTIONS_QUERY),
    ("classes", CLASSES_QUERY),
    ("calls", CALLS_QUERY),
    ("imports", IMPORTS_QUERY),
];

pub fn grammar() -> Result<TreeSitterGrammar, QueryError> {
    Ok(TreeSitterGrammar::new(
        "python",
        tree_sitter_python::LANGUAGE.into(),
        tree_sitter_python::NODE_TYPES,
    )?
    .with_aliases(&["py"])
    .with_extensions(&["py", "pyi"])
    .with_presets(PRESETS))
}
