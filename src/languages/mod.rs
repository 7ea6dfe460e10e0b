pub mod javascript;
pub mod node_types;
pub mod python;
pub mod rust;
pub mod typescript;

pub use node_types::{KindInfo, NodeTypes, ERROR_KIND};

use crate::error::QueryError;
use crate::parser;
use crate::tree::SyntaxTree;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A canned query registered with a grammar, e.g. `("functions", "(function_item) @function")`.
pub type Preset = (&'static str, &'static str);

/// Everything the engine needs to know about one source language.
pub trait Grammar: Send + Sync {
    /// Canonical language tag, e.g. `rust`.
    fn name(&self) -> &str;

    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// File extensions (without the dot) this grammar handles.
    fn extensions(&self) -> &[&str] {
        &[]
    }

    fn node_types(&self) -> &NodeTypes;

    fn presets(&self) -> &[Preset] {
        &[]
    }

    /// Parse `source` into a best-effort tree; syntax errors become `ERROR`
    /// nodes, only unrecoverable conditions are returned as errors.
    fn parse<'s>(&self, source: &'s str) -> Result<SyntaxTree<'s>, QueryError>;
}

/// A [`Grammar`] backed by a compiled tree-sitter language.
pub struct TreeSitterGrammar {
    name: &'static str,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
    presets: &'static [Preset],
    language: tree_sitter::Language,
    node_types: NodeTypes,
}

impl TreeSitterGrammar {
    pub fn new(
        name: &'static str,
        language: tree_sitter::Language,
        node_types_json: &str,
    ) -> Result<Self, QueryError> {
        let node_types =
            NodeTypes::from_json(node_types_json).map_err(|e| QueryError::InvalidGrammar {
                language: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(TreeSitterGrammar {
            name,
            aliases: &[],
            extensions: &[],
            presets: &[],
            language,
            node_types,
        })
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_presets(mut self, presets: &'static [Preset]) -> Self {
        self.presets = presets;
        self
    }
}

impl Grammar for TreeSitterGrammar {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&str] {
        self.aliases
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn node_types(&self) -> &NodeTypes {
        &self.node_types
    }

    fn presets(&self) -> &[Preset] {
        self.presets
    }

    fn parse<'s>(&self, source: &'s str) -> Result<SyntaxTree<'s>, QueryError> {
        parser::parse_tree_sitter(source, &self.language, self.name)
    }
}

/// Read-only lookup from language tags and file extensions to grammars.
///
/// Built once at startup and passed to whoever needs it; there is no global
/// instance.
#[derive(Default, Clone)]
pub struct GrammarRegistry {
    grammars: Vec<Arc<dyn Grammar>>,
    by_tag: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every bundled grammar.
    pub fn builtin() -> Result<Self, QueryError> {
        let mut registry = Self::new();
        registry.register(rust::grammar()?);
        registry.register(typescript::grammar()?);
        registry.register(typescript::tsx_grammar()?);
        registry.register(javascript::grammar()?);
        registry.register(python::grammar()?);
        Ok(registry)
    }

    /// Add a grammar; a tag or extension already taken is re-pointed to it.
    pub fn register<G: Grammar + 'static>(&mut self, grammar: G) {
        let index = self.grammars.len();
        let tags = std::iter::once(grammar.name()).chain(grammar.aliases().iter().copied());
        for tag in tags {
            if self.by_tag.insert(tag.to_ascii_lowercase(), index).is_some() {
                debug!(tag, "language tag re-registered");
            }
        }
        for ext in grammar.extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), index);
        }
        self.grammars.push(Arc::new(grammar));
    }

    pub fn grammar_for(&self, tag: &str) -> Result<Arc<dyn Grammar>, QueryError> {
        self.by_tag
            .get(&tag.trim().to_ascii_lowercase())
            .map(|index| Arc::clone(&self.grammars[*index]))
            .ok_or_else(|| QueryError::GrammarNotFound {
                language: tag.to_string(),
            })
    }

    /// Detect the grammar from a file extension.
    pub fn grammar_for_path(&self, path: &Path) -> Result<Arc<dyn Grammar>, QueryError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| QueryError::GrammarNotFound {
                language: path.display().to_string(),
            })?;
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(|index| Arc::clone(&self.grammars[*index]))
            .ok_or_else(|| QueryError::GrammarNotFound {
                language: extension.to_string(),
            })
    }

    /// Canonical language tag for a path, if its extension is registered.
    pub fn detect_language(&self, path: &Path) -> Option<&str> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let index = self.by_extension.get(&extension)?;
        Some(self.grammars[*index].name())
    }

    pub fn is_supported_file(&self, path: &Path) -> bool {
        self.detect_language(path).is_some()
    }

    pub fn languages(&self) -> impl Iterator<Item = &dyn Grammar> {
        self.grammars.iter().map(|g| g.as_ref())
    }
}
