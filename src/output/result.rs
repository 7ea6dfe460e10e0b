//! Conversion of capture sets into a serializable, tree-independent shape.

use crate::matcher::{CapturedNode, MatchResult};
use crate::tree::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One-based line and column, as shown to people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl From<Position> for LineColumn {
    fn from(position: Position) -> Self {
        LineColumn {
            line: position.line + 1,
            column: position.column + 1,
        }
    }
}

/// A captured piece of source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Fragment {
    fn new(node: &CapturedNode, source: &str) -> Self {
        Fragment {
            text: source
                .get(node.byte_range())
                .unwrap_or_default()
                .to_string(),
            kind: node.kind.to_string(),
            start_byte: node.start_byte,
            end_byte: node.end_byte,
            start: node.start.into(),
            end: node.end.into(),
        }
    }
}

/// Matches in result order; each maps capture name to its fragment, or
/// `None` for a capture that stayed unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedResult(pub Vec<BTreeMap<String, Option<Fragment>>>);

impl FormattedResult {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BTreeMap<String, Option<Fragment>>> {
        self.0.iter()
    }
}

pub fn format(result: &MatchResult, source: &str) -> FormattedResult {
    FormattedResult(
        result
            .iter()
            .map(|set| {
                set.captures
                    .iter()
                    .map(|capture| {
                        let fragment = capture.node.as_ref().map(|n| Fragment::new(n, source));
                        (capture.name.clone(), fragment)
                    })
                    .collect()
            })
            .collect(),
    )
}
