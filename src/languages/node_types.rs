//! Node kind and field tables of a grammar.
//!
//! Tree-sitter grammars ship a `node-types.json` describing every visible node
//! kind, the fields each kind may carry, and the subtypes of each supertype.
//! Query compilation validates against these tables.

use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Kind tree-sitter produces for unparseable input.
pub const ERROR_KIND: &str = "ERROR";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindInfo {
    pub fields: BTreeSet<String>,
    /// Non-empty for supertypes such as `_expression`.
    pub subtypes: Vec<String>,
}

impl KindInfo {
    pub fn is_supertype(&self) -> bool {
        !self.subtypes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeTypes {
    named: BTreeMap<String, KindInfo>,
    tokens: BTreeSet<String>,
    fields: BTreeSet<String>,
}

#[derive(Deserialize)]
struct RawNodeType {
    #[serde(rename = "type")]
    kind: String,
    named: bool,
    #[serde(default)]
    fields: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    subtypes: Vec<RawTypeRef>,
}

#[derive(Deserialize)]
struct RawTypeRef {
    #[serde(rename = "type")]
    kind: String,
    named: bool,
}

impl NodeTypes {
    /// Load the tables from a tree-sitter `node-types.json` document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawNodeType> = serde_json::from_str(json)?;
        let mut types = NodeTypes::default();
        for entry in raw {
            if !entry.named {
                types.tokens.insert(entry.kind);
                continue;
            }
            let info = KindInfo {
                fields: entry.fields.into_keys().collect(),
                subtypes: entry
                    .subtypes
                    .into_iter()
                    .filter(|s| s.named)
                    .map(|s| s.kind)
                    .collect(),
            };
            types.fields.extend(info.fields.iter().cloned());
            types.named.insert(entry.kind, info);
        }
        Ok(types)
    }

    /// Add a named kind with its legal fields.
    pub fn with_kind(mut self, kind: &str, fields: &[&str]) -> Self {
        let info = KindInfo {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            subtypes: Vec::new(),
        };
        self.fields.extend(info.fields.iter().cloned());
        self.named.insert(kind.to_string(), info);
        self
    }

    pub fn with_supertype(mut self, kind: &str, subtypes: &[&str]) -> Self {
        self.named.insert(
            kind.to_string(),
            KindInfo {
                fields: BTreeSet::new(),
                subtypes: subtypes.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    /// Add an anonymous token such as `"("` or `"return"`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.tokens.insert(token.to_string());
        self
    }

    pub fn kind(&self, kind: &str) -> Option<&KindInfo> {
        self.named.get(kind)
    }

    pub fn is_named_kind(&self, kind: &str) -> bool {
        kind == ERROR_KIND || self.named.contains_key(kind)
    }

    pub fn is_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_supertype(&self, kind: &str) -> bool {
        self.kind(kind).is_some_and(KindInfo::is_supertype)
    }

    /// Whether any kind of the grammar carries `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields_of(&self, kind: &str) -> Option<&BTreeSet<String>> {
        self.kind(kind).map(|info| &info.fields)
    }

    pub fn named_kinds(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// The kinds a pattern naming `kind` accepts: the kind itself plus, for
    /// supertypes, every concrete subtype reachable from it.
    pub fn expand(&self, kind: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut pending = vec![kind.to_string()];
        while let Some(next) = pending.pop() {
            if !out.insert(next.clone()) {
                continue;
            }
            if let Some(info) = self.named.get(&next) {
                pending.extend(info.subtypes.iter().cloned());
            }
        }
        out
    }
}
