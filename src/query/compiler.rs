use super::lexer::{tokenize, Token, TokenKind};
use super::pattern::{
    CaptureId, ChildPattern, NodeMatcher, Operand, Pattern, PatternNode, Predicate, Quantifier,
};
use super::{Query, QuerySyntaxError, SyntaxErrorKind};
use crate::languages::{Grammar, NodeTypes};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// Compile `query` against `grammar`.
pub fn compile(query: &str, grammar: &dyn Grammar) -> Result<Query, QuerySyntaxError> {
    let tokens = tokenize(query)?;
    let mut compiler = Compiler {
        tokens,
        pos: 0,
        language: grammar.name(),
        types: grammar.node_types(),
        captures: Captures::default(),
    };

    let mut patterns = Vec::new();
    while !compiler.at_end() {
        patterns.push(compiler.top_level()?);
    }
    if patterns.is_empty() {
        return Err(QuerySyntaxError::new(1, 1, SyntaxErrorKind::Empty));
    }

    debug!(
        language = grammar.name(),
        patterns = patterns.len(),
        "compiled query"
    );
    Ok(Query::new(grammar.name().to_string(), patterns))
}

/// Capture namespace of the pattern being compiled. Predicates may mention a
/// capture before its `@name` appears, so references are recorded and checked
/// once the pattern is complete.
#[derive(Default)]
struct Captures {
    names: Vec<String>,
    declared: Vec<bool>,
    first_use: Vec<(usize, usize)>,
}

impl Captures {
    fn id(&mut self, name: &str, at: (usize, usize)) -> CaptureId {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return CaptureId(index);
        }
        self.names.push(name.to_string());
        self.declared.push(false);
        self.first_use.push(at);
        CaptureId(self.names.len() - 1)
    }

    fn declare(&mut self, name: &str, at: (usize, usize)) -> Result<CaptureId, QuerySyntaxError> {
        let id = self.id(name, at);
        if self.declared[id.0] {
            return Err(QuerySyntaxError::new(
                at.0,
                at.1,
                SyntaxErrorKind::DuplicateCapture {
                    name: name.to_string(),
                },
            ));
        }
        self.declared[id.0] = true;
        Ok(id)
    }

    fn finish(&mut self) -> Result<Vec<String>, QuerySyntaxError> {
        if let Some(index) = self.declared.iter().position(|d| !d) {
            let (line, column) = self.first_use[index];
            return Err(QuerySyntaxError::new(
                line,
                column,
                SyntaxErrorKind::UndefinedCapture {
                    name: self.names[index].clone(),
                },
            ));
        }
        self.declared.clear();
        self.first_use.clear();
        Ok(std::mem::take(&mut self.names))
    }
}

struct Compiler<'g> {
    tokens: Vec<Token>,
    pos: usize,
    language: &'g str,
    types: &'g NodeTypes,
    captures: Captures,
}

impl Compiler<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_second(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    /// Position of the next token, or of the last one at end of input.
    fn here(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or((1, 1), |t| (t.line, t.column))
    }

    fn error(&self, kind: SyntaxErrorKind) -> QuerySyntaxError {
        let (line, column) = self.here();
        QuerySyntaxError::new(line, column, kind)
    }

    fn unexpected(&self, expected: &'static str) -> QuerySyntaxError {
        match self.peek() {
            Some(found) => self.error(SyntaxErrorKind::Unexpected {
                found: found.to_string(),
                expected,
            }),
            None => self.error(SyntaxErrorKind::UnexpectedEnd { expected }),
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, QuerySyntaxError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| self.unexpected(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn top_level(&mut self) -> Result<Pattern, QuerySyntaxError> {
        let line = self.here().0;
        if self.peek() == Some(&TokenKind::LParen)
            && matches!(self.peek_second(), Some(TokenKind::Predicate(_)))
        {
            return Err(self.error(SyntaxErrorKind::Unsupported(
                "a predicate outside of a pattern group",
            )));
        }
        let (mut root, quantifier) = self.pattern()?;
        if quantifier != Quantifier::One {
            return Err(self.error(SyntaxErrorKind::Unsupported(
                "a quantifier on a top-level pattern",
            )));
        }
        let capture_names = self.captures.finish()?;
        let mut predicates = Vec::new();
        hoist_predicates(&mut root, &mut predicates);
        Ok(Pattern {
            root,
            capture_names,
            predicates,
            line,
        })
    }

    /// One pattern plus its quantifier and capture suffixes.
    fn pattern(&mut self) -> Result<(PatternNode, Quantifier), QuerySyntaxError> {
        let token = self.next("a pattern")?;
        let mut node = match token.kind {
            TokenKind::LParen => self.parenthesized()?,
            TokenKind::LBracket => self.alternation()?,
            TokenKind::Ident(name) if name == "_" => {
                PatternNode::new(NodeMatcher::Wildcard { named_only: false })
            }
            TokenKind::Str(text) => {
                if !self.types.is_token(&text) {
                    return Err(QuerySyntaxError::new(
                        token.line,
                        token.column,
                        SyntaxErrorKind::UnknownToken {
                            token: text,
                            language: self.language.to_string(),
                        },
                    ));
                }
                PatternNode::new(NodeMatcher::Token(text))
            }
            TokenKind::Dot => {
                self.pos -= 1;
                return Err(self.error(SyntaxErrorKind::Unsupported("the anchor operator '.'")));
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("a pattern"));
            }
        };

        let quantifier = match self.peek() {
            Some(TokenKind::Question) => Quantifier::ZeroOrOne,
            Some(TokenKind::Star) => Quantifier::ZeroOrMore,
            Some(TokenKind::Plus) => Quantifier::OneOrMore,
            _ => Quantifier::One,
        };
        if quantifier != Quantifier::One {
            self.pos += 1;
        }

        while let Some(TokenKind::Capture(name)) = self.peek() {
            let name = name.clone();
            let at = self.here();
            let id = self.captures.declare(&name, at)?;
            node.captures.push(id);
            self.pos += 1;
        }

        Ok((node, quantifier))
    }

    /// After `(`: a node pattern, or a group of one pattern with predicates.
    fn parenthesized(&mut self) -> Result<PatternNode, QuerySyntaxError> {
        match self.peek() {
            Some(TokenKind::Ident(_)) => self.node_pattern(),
            Some(TokenKind::LParen) | Some(TokenKind::LBracket) | Some(TokenKind::Str(_)) => {
                self.group()
            }
            Some(TokenKind::Predicate(_)) => Err(self.error(SyntaxErrorKind::Unsupported(
                "a predicate outside of a pattern group",
            ))),
            _ => Err(self.unexpected("a node kind")),
        }
    }

    fn group(&mut self) -> Result<PatternNode, QuerySyntaxError> {
        let (mut inner, quantifier) = self.pattern()?;
        if quantifier != Quantifier::One {
            return Err(self.error(SyntaxErrorKind::Unsupported(
                "a quantifier inside a pattern group",
            )));
        }
        loop {
            match self.peek() {
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    return Ok(inner);
                }
                Some(TokenKind::LParen)
                    if matches!(self.peek_second(), Some(TokenKind::Predicate(_))) =>
                {
                    self.pos += 1;
                    let predicate = self.predicate()?;
                    inner.predicates.push(predicate);
                }
                None => return Err(self.unexpected("')'")),
                _ => {
                    return Err(self.error(SyntaxErrorKind::Unsupported(
                        "a sibling sequence (several patterns in one group)",
                    )))
                }
            }
        }
    }

    fn node_pattern(&mut self) -> Result<PatternNode, QuerySyntaxError> {
        let token = self.next("a node kind")?;
        let TokenKind::Ident(kind) = token.kind else {
            return Err(self.unexpected("a node kind"));
        };

        let mut node = if kind == "_" {
            PatternNode::new(NodeMatcher::Wildcard { named_only: true })
        } else if self.types.is_named_kind(&kind) {
            PatternNode::new(NodeMatcher::Kind {
                accepted: self.types.expand(&kind),
                name: kind,
            })
        } else {
            return Err(QuerySyntaxError::new(
                token.line,
                token.column,
                SyntaxErrorKind::UnknownKind {
                    kind,
                    language: self.language.to_string(),
                },
            ));
        };

        loop {
            match self.peek() {
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    return Ok(node);
                }
                None => return Err(self.unexpected("')'")),
                Some(TokenKind::Ident(_)) if self.peek_second() == Some(&TokenKind::Colon) => {
                    let field = self.field_name(&node)?;
                    self.pos += 1;
                    let (pattern, quantifier) = self.pattern()?;
                    node.children.push(ChildPattern {
                        field: Some(field),
                        quantifier,
                        pattern,
                    });
                }
                Some(TokenKind::Bang) => {
                    self.pos += 1;
                    if !matches!(self.peek(), Some(TokenKind::Ident(_))) {
                        return Err(self.unexpected("a field name after '!'"));
                    }
                    let field = self.field_name(&node)?;
                    node.negated_fields.push(field);
                }
                Some(TokenKind::LParen)
                    if matches!(self.peek_second(), Some(TokenKind::Predicate(_))) =>
                {
                    self.pos += 1;
                    let predicate = self.predicate()?;
                    node.predicates.push(predicate);
                }
                Some(TokenKind::Dot) => {
                    return Err(self.error(SyntaxErrorKind::Unsupported(
                        "the anchor operator '.'",
                    )))
                }
                Some(_) => {
                    let (pattern, quantifier) = self.pattern()?;
                    node.children.push(ChildPattern {
                        field: None,
                        quantifier,
                        pattern,
                    });
                }
            }
        }
    }

    /// Consume a field name and check it against the parent pattern.
    fn field_name(&mut self, parent: &PatternNode) -> Result<String, QuerySyntaxError> {
        let at = self.here();
        let token = self.next("a field name")?;
        let TokenKind::Ident(field) = token.kind else {
            return Err(self.unexpected("a field name"));
        };
        let error = |kind| QuerySyntaxError::new(at.0, at.1, kind);

        if !self.types.has_field(&field) {
            return Err(error(SyntaxErrorKind::UnknownField {
                field,
                language: self.language.to_string(),
            }));
        }
        if let NodeMatcher::Kind { name, .. } = &parent.matcher {
            let concrete = !self.types.is_supertype(name);
            if let Some(fields) = self.types.fields_of(name).filter(|_| concrete) {
                if !fields.contains(&field) {
                    return Err(error(SyntaxErrorKind::FieldNotOnKind {
                        field,
                        kind: name.clone(),
                        language: self.language.to_string(),
                    }));
                }
            }
        }
        Ok(field)
    }

    fn alternation(&mut self) -> Result<PatternNode, QuerySyntaxError> {
        let mut branches = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::RBracket) => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.unexpected("']'")),
                Some(_) => {
                    let (branch, quantifier) = self.pattern()?;
                    if quantifier != Quantifier::One {
                        return Err(self.error(SyntaxErrorKind::Unsupported(
                            "a quantifier on an alternation branch",
                        )));
                    }
                    branches.push(branch);
                }
            }
        }
        if branches.is_empty() {
            return Err(self.error(SyntaxErrorKind::Unexpected {
                found: "']'".to_string(),
                expected: "at least one alternative",
            }));
        }
        Ok(PatternNode::new(NodeMatcher::Alternation(branches)))
    }

    /// After `(`, with the predicate name next.
    fn predicate(&mut self) -> Result<Predicate, QuerySyntaxError> {
        let at = self.here();
        let token = self.next("a predicate")?;
        let TokenKind::Predicate(name) = token.kind else {
            return Err(self.unexpected("a predicate"));
        };

        let mut args = Vec::new();
        loop {
            let token = self.next("')'")?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Capture(capture) => {
                    let id = self.captures.id(&capture, (token.line, token.column));
                    args.push(Operand::Capture(id));
                }
                TokenKind::Str(text) | TokenKind::Ident(text) => args.push(Operand::Text(text)),
                other => {
                    return Err(QuerySyntaxError::new(
                        token.line,
                        token.column,
                        SyntaxErrorKind::Unexpected {
                            found: other.to_string(),
                            expected: "a capture or string argument",
                        },
                    ))
                }
            }
        }

        let invalid = |message: &str| {
            QuerySyntaxError::new(
                at.0,
                at.1,
                SyntaxErrorKind::InvalidPredicate {
                    name: name.clone(),
                    message: message.to_string(),
                },
            )
        };
        let (negate, base) = match name.strip_prefix("not-") {
            Some(base) => (true, base),
            None => (false, name.as_str()),
        };
        if !matches!(base, "eq?" | "match?" | "any-of?") {
            return Err(QuerySyntaxError::new(
                at.0,
                at.1,
                SyntaxErrorKind::UnknownPredicate { name: name.clone() },
            ));
        }
        let mut args = args.into_iter();
        let Some(Operand::Capture(capture)) = args.next() else {
            return Err(invalid("expects a capture as its first argument"));
        };

        match base {
            "eq?" => {
                let value = args.next().ok_or_else(|| invalid("expects 2 arguments"))?;
                if args.next().is_some() {
                    return Err(invalid("expects 2 arguments"));
                }
                Ok(Predicate::Eq {
                    capture,
                    value,
                    negate,
                })
            }
            "match?" => {
                let pattern = match (args.next(), args.next()) {
                    (Some(Operand::Text(pattern)), None) => pattern,
                    _ => return Err(invalid("expects a capture and a regex string")),
                };
                let regex = Regex::new(&pattern).map_err(|e| {
                    QuerySyntaxError::new(
                        at.0,
                        at.1,
                        SyntaxErrorKind::InvalidRegex {
                            predicate: name.clone(),
                            message: e.to_string(),
                        },
                    )
                })?;
                Ok(Predicate::Match {
                    capture,
                    regex,
                    negate,
                })
            }
            _ => {
                let values = args
                    .map(|arg| match arg {
                        Operand::Text(text) => Ok(text),
                        Operand::Capture(_) => Err(invalid("accepts only string values")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if values.is_empty() {
                    return Err(invalid("expects at least one value"));
                }
                Ok(Predicate::AnyOf {
                    capture,
                    values,
                    negate,
                })
            }
        }
    }
}

/// Move predicates that reference captures bound outside their node's
/// subtree up to the pattern level, where every capture is known.
fn hoist_predicates(node: &mut PatternNode, out: &mut Vec<Predicate>) -> BTreeSet<CaptureId> {
    let mut inside: BTreeSet<CaptureId> = node.captures.iter().copied().collect();
    if let NodeMatcher::Alternation(branches) = &mut node.matcher {
        for branch in branches {
            inside.extend(hoist_predicates(branch, out));
        }
    }
    for child in &mut node.children {
        inside.extend(hoist_predicates(&mut child.pattern, out));
    }
    let (keep, hoist): (Vec<Predicate>, Vec<Predicate>) = node
        .predicates
        .drain(..)
        .partition(|p| p.captures().iter().all(|c| inside.contains(c)));
    node.predicates = keep;
    out.extend(hoist);
    inside
}
