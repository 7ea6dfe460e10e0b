use regex::Regex;
use std::collections::BTreeSet;

/// Index of a capture name within its [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureId(pub(crate) usize);

impl CaptureId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    pub fn is_optional(self) -> bool {
        matches!(self, Quantifier::ZeroOrOne | Quantifier::ZeroOrMore)
    }
}

/// What a single pattern node accepts before its children are considered.
#[derive(Debug, Clone)]
pub enum NodeMatcher {
    /// A named kind; `accepted` holds the kind plus supertype expansion.
    Kind {
        name: String,
        accepted: BTreeSet<String>,
    },
    /// An anonymous node spelled as a string literal, e.g. `"return"`.
    Token(String),
    /// `(_)` when `named_only`, bare `_` otherwise.
    Wildcard { named_only: bool },
    /// `[a b c]`: the first branch that matches wins.
    Alternation(Vec<PatternNode>),
}

#[derive(Debug, Clone)]
pub struct ChildPattern {
    /// `Some` for `field: pattern`; unfielded children match in order.
    pub field: Option<String>,
    pub quantifier: Quantifier,
    pub pattern: PatternNode,
}

#[derive(Debug, Clone)]
pub struct PatternNode {
    pub matcher: NodeMatcher,
    pub children: Vec<ChildPattern>,
    /// `!field`: the node must not have a child under this field.
    pub negated_fields: Vec<String>,
    pub captures: Vec<CaptureId>,
    /// Checked once this node and its subtree are bound.
    pub predicates: Vec<Predicate>,
}

impl PatternNode {
    pub fn new(matcher: NodeMatcher) -> Self {
        PatternNode {
            matcher,
            children: Vec::new(),
            negated_fields: Vec::new(),
            captures: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn field_children(&self) -> impl Iterator<Item = (&str, &ChildPattern)> {
        self.children
            .iter()
            .filter_map(|c| c.field.as_deref().map(|field| (field, c)))
    }

    pub fn ordered_children(&self) -> impl Iterator<Item = &ChildPattern> {
        self.children.iter().filter(|c| c.field.is_none())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Text(String),
    Capture(CaptureId),
}

/// Text constraint over captured nodes.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq {
        capture: CaptureId,
        value: Operand,
        negate: bool,
    },
    Match {
        capture: CaptureId,
        regex: Regex,
        negate: bool,
    },
    AnyOf {
        capture: CaptureId,
        values: Vec<String>,
        negate: bool,
    },
}

impl Predicate {
    pub fn captures(&self) -> Vec<CaptureId> {
        match self {
            Predicate::Eq {
                capture,
                value: Operand::Capture(other),
                ..
            } => vec![*capture, *other],
            Predicate::Eq { capture, .. }
            | Predicate::Match { capture, .. }
            | Predicate::AnyOf { capture, .. } => vec![*capture],
        }
    }
}

/// One top-level pattern of a query.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub root: PatternNode,
    /// Indexed by [`CaptureId`]; unique within the pattern.
    pub capture_names: Vec<String>,
    /// Predicates spanning captures from different subtrees, checked last.
    pub predicates: Vec<Predicate>,
    /// One-based line where the pattern starts in the query text.
    pub line: usize,
}

impl Pattern {
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_count(&self) -> usize {
        self.capture_names.len()
    }
}
