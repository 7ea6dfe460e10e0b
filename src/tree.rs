use std::ops::Range;

/// Index of a node inside its [`SyntaxTree`].
///
/// Ids are handed out in pre-order, so comparing two ids compares their
/// traversal positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub named: bool,
    pub is_error: bool,
    pub is_missing: bool,
    /// Field name under which the parent holds this node.
    pub field: Option<&'static str>,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Position,
    pub end: Position,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }
}

/// Immutable syntax tree borrowing the text it was parsed from.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'s> {
    source: &'s str,
    nodes: Vec<SyntaxNode>,
}

impl<'s> SyntaxTree<'s> {
    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    pub fn children_by_field<'a>(
        &'a self,
        id: NodeId,
        field: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |child| self.node(*child).field == Some(field))
    }

    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children_by_field(id, field).next()
    }

    /// Exact source text covered by the node.
    pub fn text(&self, id: NodeId) -> &'s str {
        self.source.get(self.node(id).byte_range()).unwrap_or_default()
    }

    /// All node ids in pre-order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn has_error(&self) -> bool {
        self.nodes.iter().any(|n| n.is_error || n.is_missing)
    }

    /// `ERROR` and missing-token nodes, in pre-order.
    pub fn error_nodes(&self) -> Vec<NodeId> {
        self.preorder()
            .filter(|id| {
                let node = self.node(*id);
                node.is_error || node.is_missing
            })
            .collect()
    }
}

/// Shape of a node handed to [`TreeBuilder::open`].
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    pub kind: &'static str,
    pub named: bool,
    pub field: Option<&'static str>,
    pub is_error: bool,
    pub is_missing: bool,
    pub start_byte: usize,
    pub start: Position,
}

impl NodeSpec {
    pub fn named(kind: &'static str, start_byte: usize, start: Position) -> Self {
        NodeSpec {
            kind,
            named: true,
            field: None,
            is_error: false,
            is_missing: false,
            start_byte,
            start,
        }
    }

    pub fn anonymous(kind: &'static str, start_byte: usize, start: Position) -> Self {
        NodeSpec {
            named: false,
            ..NodeSpec::named(kind, start_byte, start)
        }
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }
}

/// Builds a [`SyntaxTree`] from nested open/close calls in pre-order.
pub struct TreeBuilder<'s> {
    source: &'s str,
    nodes: Vec<SyntaxNode>,
    stack: Vec<NodeId>,
    malformed: bool,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        TreeBuilder {
            source,
            nodes: Vec::new(),
            stack: Vec::new(),
            malformed: false,
        }
    }

    pub fn open(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.stack.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            // a second root
            self.malformed = true;
        }
        self.nodes.push(SyntaxNode {
            kind: spec.kind,
            named: spec.named,
            is_error: spec.is_error,
            is_missing: spec.is_missing,
            field: spec.field,
            start_byte: spec.start_byte,
            end_byte: spec.start_byte,
            start: spec.start,
            end: spec.start,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        self.stack.push(id);
        id
    }

    pub fn close(&mut self, end_byte: usize, end: Position) {
        let Some(id) = self.stack.pop() else {
            self.malformed = true;
            return;
        };
        let node = &mut self.nodes[id.0];
        if end_byte < node.start_byte {
            self.malformed = true;
        }
        node.end_byte = end_byte;
        node.end = end;
    }

    /// Open and immediately close a childless node.
    pub fn leaf(&mut self, spec: NodeSpec, end_byte: usize, end: Position) -> NodeId {
        let id = self.open(spec);
        self.close(end_byte, end);
        id
    }

    /// Returns `None` when no root was opened, a node is still open, or a
    /// span escapes its parent.
    pub fn finish(self) -> Option<SyntaxTree<'s>> {
        if self.malformed || self.nodes.is_empty() || !self.stack.is_empty() {
            return None;
        }
        let contained = self.nodes.iter().all(|node| {
            node.parent.map_or(true, |p| {
                let parent = &self.nodes[p.0];
                parent.start_byte <= node.start_byte && node.end_byte <= parent.end_byte
            })
        });
        if !contained || self.nodes.iter().any(|n| n.end_byte > self.source.len()) {
            return None;
        }
        Some(SyntaxTree {
            source: self.source,
            nodes: self.nodes,
        })
    }
}
