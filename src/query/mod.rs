//! Pattern-query compilation.
//!
//! Queries use the tree-sitter S-expression syntax:
//!
//! ```text
//! (function_declaration
//!   name: (identifier) @name
//!   (#eq? @name "main")) @function
//! ```
//!
//! A query string is compiled against one [`Grammar`](crate::languages::Grammar)
//! into a [`Query`]: every node kind, anonymous token and field is checked
//! against the grammar so a typo fails here instead of silently matching
//! nothing.

mod compiler;
mod lexer;
mod pattern;

pub use compiler::compile;
pub use pattern::{
    CaptureId, ChildPattern, NodeMatcher, Operand, Pattern, PatternNode, Predicate, Quantifier,
};

use thiserror::Error;

/// A compiled query: one or more top-level patterns for one grammar.
#[derive(Debug, Clone)]
pub struct Query {
    language: String,
    patterns: Vec<Pattern>,
}

impl Query {
    pub(crate) fn new(language: String, patterns: Vec<Pattern>) -> Self {
        Query { language, patterns }
    }

    /// Name of the grammar the query was validated against.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Capture names across all patterns, first occurrence order.
    pub fn capture_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.patterns.iter().flat_map(|p| p.capture_names()) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }
}

/// A malformed or grammar-invalid query, located by one-based line and column.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at {line}:{column}")]
pub struct QuerySyntaxError {
    pub line: usize,
    pub column: usize,
    pub kind: SyntaxErrorKind,
}

impl QuerySyntaxError {
    pub fn new(line: usize, column: usize, kind: SyntaxErrorKind) -> Self {
        QuerySyntaxError { line, column, kind }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    #[error("unexpected {found}, expected {expected}")]
    Unexpected {
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of query, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("query contains no patterns")]
    Empty,

    #[error("unknown node kind '{kind}' for {language}")]
    UnknownKind { kind: String, language: String },

    #[error("unknown token \"{token}\" for {language}")]
    UnknownToken { token: String, language: String },

    #[error("unknown field '{field}' for {language}")]
    UnknownField { field: String, language: String },

    #[error("field '{field}' is not valid on node kind '{kind}' in {language}")]
    FieldNotOnKind {
        field: String,
        kind: String,
        language: String,
    },

    #[error("duplicate capture '@{name}'")]
    DuplicateCapture { name: String },

    #[error("predicate references undefined capture '@{name}'")]
    UndefinedCapture { name: String },

    #[error("unknown predicate '#{name}'")]
    UnknownPredicate { name: String },

    #[error("predicate '#{name}' {message}")]
    InvalidPredicate { name: String, message: String },

    #[error("invalid regex in '#{predicate}': {message}")]
    InvalidRegex { predicate: String, message: String },

    #[error("{0} is not supported")]
    Unsupported(&'static str),
}
