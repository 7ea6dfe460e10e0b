//! Pattern execution over a [`SyntaxTree`].
//!
//! Every node is tried as an anchor for every pattern of the query, in
//! pre-order. A successful anchor yields one [`CaptureSet`]; traversal
//! continues into the anchor's children, so nested matches are reported too.

use crate::query::{
    CaptureId, ChildPattern, NodeMatcher, Operand, Pattern, PatternNode, Predicate, Query,
};
use crate::tree::{NodeId, Position, SyntaxTree};
use std::ops::Range;
use tracing::debug;

type Bindings = Vec<Option<NodeId>>;

/// Location and kind of a captured node, independent of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedNode {
    pub id: NodeId,
    pub kind: &'static str,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Position,
    pub end: Position,
}

impl CapturedNode {
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    /// `None` when the capture sits in an optional part that did not match.
    pub node: Option<CapturedNode>,
}

/// Captures of one successful anchor, one entry per declared capture name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSet {
    pub pattern_index: usize,
    pub anchor: NodeId,
    pub captures: Vec<Capture>,
}

impl CaptureSet {
    pub fn get(&self, name: &str) -> Option<&CapturedNode> {
        self.captures
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.node.as_ref())
    }
}

/// Capture sets ordered by anchor pre-order position, then pattern index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matches: Vec<CaptureSet>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptureSet> {
        self.matches.iter()
    }
}

/// Run every pattern of `query` over `tree`.
pub fn execute(tree: &SyntaxTree<'_>, query: &Query) -> MatchResult {
    let matcher = Matcher { tree };
    let mut matches = Vec::new();

    for anchor in tree.preorder() {
        for (index, pattern) in query.patterns().iter().enumerate() {
            if let Some(bindings) = matcher.anchor(anchor, pattern) {
                matches.push(capture_set(tree, pattern, index, anchor, &bindings));
            }
        }
    }

    // Traversal already yields this order; sorting pins it regardless of
    // how the loop above is arranged.
    matches.sort_by_key(|set| (set.anchor, set.pattern_index));
    debug!(
        nodes = tree.len(),
        patterns = query.patterns().len(),
        matches = matches.len(),
        "executed query"
    );
    MatchResult { matches }
}

fn capture_set(
    tree: &SyntaxTree<'_>,
    pattern: &Pattern,
    pattern_index: usize,
    anchor: NodeId,
    bindings: &Bindings,
) -> CaptureSet {
    let captures = pattern
        .capture_names()
        .iter()
        .zip(bindings)
        .map(|(name, bound)| Capture {
            name: name.clone(),
            node: bound.map(|id| {
                let node = tree.node(id);
                CapturedNode {
                    id,
                    kind: node.kind,
                    start_byte: node.start_byte,
                    end_byte: node.end_byte,
                    start: node.start,
                    end: node.end,
                }
            }),
        })
        .collect();
    CaptureSet {
        pattern_index,
        anchor,
        captures,
    }
}

struct Matcher<'t, 's> {
    tree: &'t SyntaxTree<'s>,
}

/// Called with the bindings of a partial match; returns whether the rest of
/// the pattern could be completed from there.
type Continuation<'k> = dyn FnMut(&mut Bindings) -> bool + 'k;

impl Matcher<'_, '_> {
    /// Bindings for `pattern` anchored at `anchor`, if it matches there.
    fn anchor(&self, anchor: NodeId, pattern: &Pattern) -> Option<Bindings> {
        let mut bindings = vec![None; pattern.capture_count()];
        let mut found = None;
        self.match_node(anchor, &pattern.root, &mut bindings, &mut |b| {
            if pattern.predicates.iter().all(|p| self.holds(p, b)) {
                found = Some(b.clone());
                true
            } else {
                false
            }
        });
        found
    }

    /// Try every way `pattern` can match at `id`, in child order, until `k`
    /// accepts one. `bindings` is left untouched when nothing is accepted.
    fn match_node(
        &self,
        id: NodeId,
        pattern: &PatternNode,
        bindings: &mut Bindings,
        k: &mut Continuation<'_>,
    ) -> bool {
        let node = self.tree.node(id);
        match &pattern.matcher {
            NodeMatcher::Kind { accepted, .. } => {
                if !(node.named && accepted.contains(node.kind)) {
                    return false;
                }
            }
            NodeMatcher::Token(token) => {
                if node.named || node.kind != token.as_str() {
                    return false;
                }
            }
            NodeMatcher::Wildcard { named_only } => {
                if *named_only && !node.named {
                    return false;
                }
            }
            NodeMatcher::Alternation(branches) => {
                return branches.iter().any(|branch| {
                    self.match_node(id, branch, bindings, &mut |b| {
                        self.match_body(id, pattern, b, k)
                    })
                });
            }
        }
        self.match_body(id, pattern, bindings, k)
    }

    /// Negated fields, field children, ordered children, then this node's
    /// captures and predicates.
    fn match_body(
        &self,
        id: NodeId,
        pattern: &PatternNode,
        bindings: &mut Bindings,
        k: &mut Continuation<'_>,
    ) -> bool {
        if pattern
            .negated_fields
            .iter()
            .any(|field| self.tree.child_by_field(id, field).is_some())
        {
            return false;
        }

        let fields: Vec<_> = pattern.field_children().collect();
        let ordered: Vec<_> = pattern.ordered_children().collect();
        let children = &self.tree.node(id).children;

        self.match_fields(id, &fields, bindings, &mut |b| {
            self.match_sequence(children, &ordered, b, &mut |b| {
                let saved = b.clone();
                for capture in &pattern.captures {
                    b[capture.index()] = Some(id);
                }
                if pattern.predicates.iter().all(|p| self.holds(p, b)) && k(b) {
                    return true;
                }
                *b = saved;
                false
            })
        })
    }

    /// Each field constraint tries the children under its field in order; an
    /// optional one may also be left unmatched.
    fn match_fields(
        &self,
        id: NodeId,
        fields: &[(&str, &ChildPattern)],
        bindings: &mut Bindings,
        k: &mut Continuation<'_>,
    ) -> bool {
        let Some(((field, child), rest)) = fields.split_first() else {
            return k(bindings);
        };
        for candidate in self.tree.children_by_field(id, field) {
            if self.match_node(candidate, &child.pattern, bindings, &mut |b| {
                self.match_fields(id, rest, b, k)
            }) {
                return true;
            }
        }
        child.quantifier.is_optional() && self.match_fields(id, rest, bindings, k)
    }

    /// Match `patterns` against an ordered subsequence of `children`,
    /// backtracking over which child each pattern consumes.
    fn match_sequence(
        &self,
        children: &[NodeId],
        patterns: &[&ChildPattern],
        bindings: &mut Bindings,
        k: &mut Continuation<'_>,
    ) -> bool {
        let Some((first, rest)) = patterns.split_first() else {
            return k(bindings);
        };
        for (i, child) in children.iter().enumerate() {
            if self.match_node(*child, &first.pattern, bindings, &mut |b| {
                self.match_sequence(&children[i + 1..], rest, b, k)
            }) {
                return true;
            }
        }
        first.quantifier.is_optional() && self.match_sequence(children, rest, bindings, k)
    }

    fn text(&self, capture: CaptureId, bindings: &Bindings) -> Option<&str> {
        bindings[capture.index()].map(|id| self.tree.text(id))
    }

    /// Predicates over unbound captures hold vacuously.
    fn holds(&self, predicate: &Predicate, bindings: &Bindings) -> bool {
        match predicate {
            Predicate::Eq {
                capture,
                value,
                negate,
            } => {
                let Some(left) = self.text(*capture, bindings) else {
                    return true;
                };
                let right = match value {
                    Operand::Text(text) => Some(text.as_str()),
                    Operand::Capture(other) => self.text(*other, bindings),
                };
                right.map_or(true, |right| (left == right) != *negate)
            }
            Predicate::Match {
                capture,
                regex,
                negate,
            } => self
                .text(*capture, bindings)
                .map_or(true, |text| regex.is_match(text) != *negate),
            Predicate::AnyOf {
                capture,
                values,
                negate,
            } => self
                .text(*capture, bindings)
                .map_or(true, |text| values.iter().any(|v| v == text) != *negate),
        }
    }
}
