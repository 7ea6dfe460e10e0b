use super::{QuerySyntaxError, SyntaxErrorKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Bang,
    Dot,
    Question,
    Star,
    Plus,
    Ident(String),
    Capture(String),
    /// `#eq?` and friends, without the leading `#`.
    Predicate(String),
    Str(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::Capture(name) => write!(f, "'@{}'", name),
            TokenKind::Predicate(name) => write!(f, "'#{}'", name),
            TokenKind::Str(text) => write!(f, "{:?}", text),
        }
    }
}

/// A token with its one-based position in the query text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

struct Cursor<'q> {
    chars: std::iter::Peekable<std::str::Chars<'q>>,
    line: usize,
    column: usize,
}

impl Cursor<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

pub fn tokenize(query: &str) -> Result<Vec<Token>, QuerySyntaxError> {
    let mut cursor = Cursor {
        chars: query.chars().peekable(),
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.column);
        let error = |kind| QuerySyntaxError::new(line, column, kind);

        if c.is_whitespace() {
            cursor.bump();
            continue;
        }
        if c == ';' {
            cursor.take_while(|c| c != '\n');
            continue;
        }

        let kind = match c {
            '(' | ')' | '[' | ']' | ':' | '!' | '.' | '?' | '*' | '+' => {
                cursor.bump();
                match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ':' => TokenKind::Colon,
                    '!' => TokenKind::Bang,
                    '.' => TokenKind::Dot,
                    '?' => TokenKind::Question,
                    '*' => TokenKind::Star,
                    _ => TokenKind::Plus,
                }
            }
            '@' => {
                cursor.bump();
                let name = cursor.take_while(|c| is_ident_char(c) || c == '.');
                if name.is_empty() {
                    return Err(error(SyntaxErrorKind::InvalidCharacter('@')));
                }
                TokenKind::Capture(name)
            }
            '#' => {
                cursor.bump();
                let name = cursor.take_while(|c| is_ident_char(c) || c == '?' || c == '!');
                if name.is_empty() {
                    return Err(error(SyntaxErrorKind::InvalidCharacter('#')));
                }
                TokenKind::Predicate(name)
            }
            '"' => {
                cursor.bump();
                TokenKind::Str(read_string(&mut cursor).ok_or_else(|| {
                    error(SyntaxErrorKind::UnterminatedString)
                })?)
            }
            c if is_ident_char(c) => TokenKind::Ident(cursor.take_while(is_ident_char)),
            other => return Err(error(SyntaxErrorKind::InvalidCharacter(other))),
        };
        tokens.push(Token { kind, line, column });
    }

    Ok(tokens)
}

/// Reads up to and including the closing quote; `None` if it never comes.
fn read_string(cursor: &mut Cursor<'_>) -> Option<String> {
    let mut out = String::new();
    loop {
        match cursor.bump()? {
            '"' => return Some(out),
            '\\' => match cursor.bump()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
}
