//! Structural code queries.
//!
//! Source text is parsed with a registered [`Grammar`] into a [`SyntaxTree`],
//! a tree-sitter style pattern query is compiled against the same grammar,
//! and the matches come back as capture sets ready for serialization.
//!
//! ```no_run
//! use codequery::{QueryOutcome, QueryService, SourceFile};
//!
//! # fn main() -> Result<(), codequery::QueryError> {
//! let service = QueryService::builtin()?;
//! let file = SourceFile::new("app.js", "javascript", "function foo() { bar(); }");
//! if let QueryOutcome::Matches(result) = service.run(&file, "(call_expression) @call")? {
//!     println!("{}", codequery::output::encode(&result, Default::default())?);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod languages;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod query;
pub mod service;
pub mod tool;
pub mod tree;

pub use error::QueryError;
pub use languages::{Grammar, GrammarRegistry};
pub use matcher::{execute, CaptureSet, MatchResult};
pub use output::{FormattedResult, OutputFormat};
pub use query::{compile, Query, QuerySyntaxError};
pub use service::{QueryOutcome, QueryService, SourceFile};
pub use tool::{
    CodeQueryTool, FsWorkspace, ToolRequest, WorkspaceReader, FILE_NOT_FOUND, NO_MATCH_FOUND,
};
pub use tree::{NodeId, SyntaxTree};
