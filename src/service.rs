//! Orchestration of one query request: grammar lookup, parse, compile,
//! execute and format.

use crate::error::QueryError;
use crate::languages::{Grammar, GrammarRegistry};
use crate::matcher::execute;
use crate::output::{format, FormattedResult};
use crate::parser::parse;
use crate::query::{compile, Query};
use crate::tree::SyntaxTree;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Source text with the language it should be parsed as.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(
        path: impl Into<PathBuf>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        SourceFile {
            path: path.into(),
            language: language.into(),
            content: content.into(),
        }
    }

    /// Build a source file whose language comes from the path's extension.
    pub fn detect(
        registry: &GrammarRegistry,
        path: impl AsRef<Path>,
        content: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let grammar = registry.grammar_for_path(path)?;
        Ok(SourceFile::new(path, grammar.name(), content))
    }
}

/// Outcome of a successful run. No match is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Matches(FormattedResult),
    NoMatch,
}

impl QueryOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, QueryOutcome::Matches(_))
    }
}

#[derive(Clone)]
pub struct QueryService {
    registry: GrammarRegistry,
}

impl QueryService {
    pub fn new(registry: GrammarRegistry) -> Self {
        QueryService { registry }
    }

    /// Service over the built-in grammars.
    pub fn builtin() -> Result<Self, QueryError> {
        Ok(QueryService::new(GrammarRegistry::builtin()?))
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    /// Compile `query` once for reuse across files of `language`.
    pub fn compile(&self, language: &str, query: &str) -> Result<Query, QueryError> {
        let grammar = self.registry.grammar_for(language)?;
        Ok(compile(query, grammar.as_ref())?)
    }

    pub fn run(&self, file: &SourceFile, query: &str) -> Result<QueryOutcome, QueryError> {
        let _span = debug_span!("query", path = %file.path.display(), language = %file.language)
            .entered();
        let grammar = self.registry.grammar_for(&file.language)?;
        let tree = parse(&file.content, grammar.as_ref())?;
        let query = compile(query, grammar.as_ref())?;
        Ok(finish(&tree, &query, &file.content))
    }

    /// Run an already compiled query. The file must use the grammar the
    /// query was compiled for.
    pub fn run_compiled(&self, file: &SourceFile, query: &Query) -> Result<QueryOutcome, QueryError> {
        let _span = debug_span!("query", path = %file.path.display(), language = %file.language)
            .entered();
        let grammar = self.registry.grammar_for(&file.language)?;
        if grammar.name() != query.language() {
            return Err(QueryError::LanguageMismatch {
                query: query.language().to_string(),
                file: grammar.name().to_string(),
            });
        }
        let tree = parse(&file.content, grammar.as_ref())?;
        Ok(finish(&tree, query, &file.content))
    }

    pub fn grammar(&self, language: &str) -> Result<Arc<dyn Grammar>, QueryError> {
        self.registry.grammar_for(language)
    }
}

fn finish(tree: &SyntaxTree<'_>, query: &Query, source: &str) -> QueryOutcome {
    let result = execute(tree, query);
    if result.is_empty() {
        debug!("no match");
        return QueryOutcome::NoMatch;
    }
    QueryOutcome::Matches(format(&result, source))
}
