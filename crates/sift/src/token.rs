//! Token stream types produced by the scanner.

use serde::Serialize;

/// Byte region of the source a token was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Byte offset of the first byte.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A string value, quoted or bare.
    Value { quoted: bool },
    /// A field path such as `status` or `org.name`.
    Field,
    /// `:`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `ALL`
    All,
    And,
    Or,
    /// `NOT` keyword or leading `-`
    Not,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl TokenKind {
    /// True for tokens that end a term: a value or a closing paren.
    pub fn terminates_term(&self) -> bool {
        matches!(self, TokenKind::Value { .. } | TokenKind::RParen)
    }

    pub fn is_comparator(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq | TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte
        )
    }

    pub fn is_set_operator(&self) -> bool {
        matches!(self, TokenKind::In | TokenKind::NotIn | TokenKind::All)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source substring. For an implicit `AND` this is the whitespace
    /// the connector was synthesized from.
    pub lexeme: String,
    /// Decoded value: unescaped string contents, snake-cased field path, or
    /// the canonical connector word. `None` where irrelevant.
    pub literal: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, literal: Option<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal,
            span,
        }
    }

    /// The decoded literal, falling back to the lexeme.
    pub fn literal_str(&self) -> &str {
        self.literal.as_deref().unwrap_or(&self.lexeme)
    }
}
