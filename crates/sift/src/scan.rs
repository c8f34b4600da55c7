//! Byte-level scanner.
//!
//! Turns source bytes into a token stream with precise byte spans:
//! - operators must be glued to their field and value (no whitespace)
//! - set keywords (`IN`, `NOT IN`, `ALL`) and connectors (`AND`, `OR`,
//!   `NOT`) are case-sensitive uppercase; anything else is a bare term
//! - whitespace between two terms inserts an implicit `AND`
//! - field identifiers are snake-case normalized per dot-separated segment

use thiserror::Error;

use crate::token::{Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unterminated string at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid operator '{op}' at position {pos}")]
    InvalidComparator { op: String, pos: usize },

    #[error("Broken operator '{op}' at position {pos}. Comparison operators must not contain whitespace.")]
    BrokenOperator { op: String, pos: usize },

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Invalid field '{lexeme}' at position {pos}. Field paths must not end with '.' or continue with a digit.")]
    InvalidField { lexeme: String, pos: usize },

    #[error("Unexpected whitespace at position {0}. Comparison operators must be attached to their field and value.")]
    InvalidPredicateSpacing(usize),
}

impl LexError {
    /// Byte offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedString(pos)
            | LexError::InvalidPredicateSpacing(pos)
            | LexError::InvalidComparator { pos, .. }
            | LexError::BrokenOperator { pos, .. }
            | LexError::UnexpectedChar { pos, .. }
            | LexError::InvalidField { pos, .. } => *pos,
        }
    }
}

/// Scan a query into tokens. The stream always ends with exactly one `Eof`.
pub fn scan(source: &str) -> Result<Vec<Token>, LexError> {
    Scanner::new(source).run()
}

// ============ Character classes ============

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_continue(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-'
}

fn is_special(b: u8) -> bool {
    is_ws(b) || matches!(b, b'(' | b')' | b':' | b'<' | b'>' | b'=' | b',' | b'\'' | b'"')
}

/// Printable byte that can appear inside a bare term. Multi-byte UTF-8
/// sequences pass through here untouched.
fn is_visible(b: u8) -> bool {
    b > 0x20 && b != 0x7f
}

// ============ Scanner ============

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    /// Inside a set-operator list; implicit `AND` is suppressed there so the
    /// parser can report a missing comma instead.
    in_list: bool,
    /// Directly after a comparison operator; the value must follow with no
    /// intervening whitespace.
    after_op: bool,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            in_list: false,
            after_op: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            let ws_start = self.pos;
            self.skip_ws();
            let had_ws = self.pos > ws_start;

            if self.after_op && had_ws && self.peek().is_some() {
                return Err(LexError::InvalidPredicateSpacing(ws_start));
            }

            let Some(b) = self.peek() else {
                let end = self.src.len();
                self.tokens
                    .push(Token::new(TokenKind::Eof, "", None, Span::new(end, 0)));
                return Ok(self.tokens);
            };

            match b {
                b'(' => {
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.after_op = false;
                    self.push_byte(TokenKind::LParen);
                }
                b')' => {
                    self.after_op = false;
                    self.in_list = false;
                    self.push_byte(TokenKind::RParen);
                }
                b',' => {
                    self.after_op = false;
                    self.push_byte(TokenKind::Comma);
                }
                b'\'' | b'"' => {
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.after_op = false;
                    self.quoted_value()?;
                }
                b'=' => {
                    return Err(LexError::InvalidComparator {
                        op: "=".into(),
                        pos: self.pos,
                    });
                }
                b':' | b'<' | b'>' => {
                    // Operators are consumed by the term scanner while still
                    // glued to a clean field identifier; reaching one here
                    // means it was detached from its field.
                    if had_ws && self.last_terminates_term() {
                        return Err(LexError::InvalidPredicateSpacing(ws_start));
                    }
                    return Err(LexError::UnexpectedChar {
                        ch: b as char,
                        pos: self.pos,
                    });
                }
                _ if self.after_op => {
                    self.after_op = false;
                    if is_visible(b) {
                        self.bare_value(self.pos);
                    } else {
                        return Err(self.unexpected_char());
                    }
                }
                b'-' => {
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.push_byte(TokenKind::Not);
                }
                _ if is_name_start(b) => self.term(ws_start, had_ws)?,
                _ if is_visible(b) => {
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.bare_value(self.pos);
                }
                _ => return Err(self.unexpected_char()),
            }
        }
    }

    // ============ Term scanning ============

    /// Scan a run starting with a name-start byte: a field identifier glued
    /// to an operator, a set-operator head, a connector keyword, or a bare
    /// full-text term.
    fn term(&mut self, ws_start: usize, had_ws: bool) -> Result<(), LexError> {
        let start = self.pos;

        loop {
            while self.peek().is_some_and(is_name_continue) {
                self.pos += 1;
            }
            match self.peek() {
                Some(b'.') => {
                    let after_dot = self.bytes.get(self.pos + 1).copied();
                    if after_dot.is_some_and(is_name_start) {
                        self.pos += 1;
                    } else {
                        // Trailing dot or dot followed by a digit/junk byte.
                        let dot_pos = self.pos;
                        self.pos += 1;
                        while self.peek().is_some_and(|b| is_visible(b) && !is_special(b)) {
                            self.pos += 1;
                        }
                        return Err(LexError::InvalidField {
                            lexeme: self.src[start..self.pos].to_string(),
                            pos: dot_pos,
                        });
                    }
                }
                Some(nb) if is_visible(nb) && !is_special(nb) => {
                    // Junk byte such as `*`: not a field path, degrade to a
                    // bare value run.
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.bare_value(start);
                    return Ok(());
                }
                _ => break,
            }
        }

        let lexeme = &self.src[start..self.pos];

        match self.peek() {
            Some(b':') => {
                self.emit_field(start, ws_start, had_ws);
                self.push_byte(TokenKind::Eq);
                self.after_op = true;
                Ok(())
            }
            Some(b'<') | Some(b'>') => {
                self.emit_field(start, ws_start, had_ws);
                self.relational_operator()?;
                self.after_op = true;
                Ok(())
            }
            Some(b'=') => Err(LexError::InvalidComparator {
                op: "=".into(),
                pos: self.pos,
            }),
            next => {
                let next_is_ws = next.is_some_and(is_ws);

                if next_is_ws
                    && let Some((kind, kw_start, kw_end)) = self.try_set_keyword()
                {
                    self.emit_field(start, ws_start, had_ws);
                    self.tokens.push(Token::new(
                        kind,
                        &self.src[kw_start..kw_end],
                        None,
                        Span::new(kw_start, kw_end - kw_start),
                    ));
                    self.pos = kw_end;
                    self.in_list = true;
                    return Ok(());
                }

                let at_right_boundary = match next {
                    None => true,
                    Some(nb) => is_ws(nb) || matches!(nb, b'(' | b')' | b','),
                };
                let at_left_boundary = had_ws
                    || match self.tokens.last() {
                        None => true,
                        Some(t) => matches!(
                            t.kind,
                            TokenKind::LParen | TokenKind::RParen | TokenKind::Comma
                        ),
                    };

                if at_left_boundary && at_right_boundary && (lexeme == "AND" || lexeme == "OR") {
                    let (kind, word) = if lexeme == "AND" {
                        (TokenKind::And, "and")
                    } else {
                        (TokenKind::Or, "or")
                    };
                    self.tokens.push(Token::new(
                        kind,
                        lexeme,
                        Some(word.to_string()),
                        Span::new(start, lexeme.len()),
                    ));
                    return Ok(());
                }

                if lexeme == "NOT" && next_is_ws {
                    self.maybe_implicit_and(ws_start, had_ws);
                    self.tokens.push(Token::new(
                        TokenKind::Not,
                        lexeme,
                        None,
                        Span::new(start, lexeme.len()),
                    ));
                    return Ok(());
                }

                self.maybe_implicit_and(ws_start, had_ws);
                self.tokens.push(Token::new(
                    TokenKind::Value { quoted: false },
                    lexeme,
                    Some(lexeme.to_string()),
                    Span::new(start, lexeme.len()),
                ));
                Ok(())
            }
        }
    }

    fn emit_field(&mut self, start: usize, ws_start: usize, had_ws: bool) {
        self.maybe_implicit_and(ws_start, had_ws);
        let lexeme = &self.src[start..self.pos];
        self.tokens.push(Token::new(
            TokenKind::Field,
            lexeme,
            Some(to_snake(lexeme)),
            Span::new(start, lexeme.len()),
        ));
    }

    /// Consume `<`, `<=`, `>` or `>=`; a whitespace-split `< =` is rejected.
    fn relational_operator(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let first = self.bytes[self.pos];
        self.pos += 1;

        if self.peek() == Some(b'=') {
            self.pos += 1;
            let kind = if first == b'<' { TokenKind::Lte } else { TokenKind::Gte };
            self.push_span(kind, start);
            return Ok(());
        }

        // `< =` split across whitespace
        let mut probe = self.pos;
        while self.bytes.get(probe).copied().is_some_and(is_ws) {
            probe += 1;
        }
        if probe > self.pos && self.bytes.get(probe) == Some(&b'=') {
            return Err(LexError::BrokenOperator {
                op: format!("{} =", first as char),
                pos: start,
            });
        }

        let kind = if first == b'<' { TokenKind::Lt } else { TokenKind::Gt };
        self.push_span(kind, start);
        Ok(())
    }

    /// Look ahead past the current whitespace for an uppercase set keyword
    /// followed by whitespace and `(`. Returns `(kind, kw_start, kw_end)`
    /// without consuming anything.
    fn try_set_keyword(&self) -> Option<(TokenKind, usize, usize)> {
        let mut p = self.pos;
        while self.bytes.get(p).copied().is_some_and(is_ws) {
            p += 1;
        }
        let kw_start = p;

        let (kind, kw_end) = if self.rest_at(p).starts_with("NOT") {
            let mut q = p + 3;
            if !self.bytes.get(q).copied().is_some_and(is_ws) {
                return None;
            }
            while self.bytes.get(q).copied().is_some_and(is_ws) {
                q += 1;
            }
            if !self.rest_at(q).starts_with("IN") {
                return None;
            }
            (TokenKind::NotIn, q + 2)
        } else if self.rest_at(p).starts_with("IN") {
            (TokenKind::In, p + 2)
        } else if self.rest_at(p).starts_with("ALL") {
            (TokenKind::All, p + 3)
        } else {
            return None;
        };

        // Keyword must be a whole word followed by whitespace, then `(`.
        let mut q = kw_end;
        if !self.bytes.get(q).copied().is_some_and(is_ws) {
            return None;
        }
        while self.bytes.get(q).copied().is_some_and(is_ws) {
            q += 1;
        }
        if self.bytes.get(q) != Some(&b'(') {
            return None;
        }
        Some((kind, kw_start, kw_end))
    }

    // ============ Values ============

    /// Consume a run of visible non-special bytes starting at `start`
    /// (part of it may already have been consumed) and emit a bare value.
    fn bare_value(&mut self, start: usize) {
        while self.peek().is_some_and(|b| is_visible(b) && !is_special(b)) {
            self.pos += 1;
        }
        let lexeme = &self.src[start..self.pos];
        self.tokens.push(Token::new(
            TokenKind::Value { quoted: false },
            lexeme,
            Some(lexeme.to_string()),
            Span::new(start, lexeme.len()),
        ));
    }

    fn quoted_value(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let quote = self.bytes[self.pos];
        self.pos += 1;

        let mut literal = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedString(start)),
                Some(b'\\') => {
                    self.pos += 1;
                    // Backslash escapes the next character literally.
                    let Some(ch) = self.src[self.pos..].chars().next() else {
                        return Err(LexError::UnterminatedString(start));
                    };
                    literal.push(ch);
                    self.pos += ch.len_utf8();
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let ch = self.src[self.pos..]
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    literal.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }

        let lexeme = &self.src[start..self.pos];
        self.tokens.push(Token::new(
            TokenKind::Value { quoted: true },
            lexeme,
            Some(literal),
            Span::new(start, lexeme.len()),
        ));
        Ok(())
    }

    // ============ Helpers ============

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn rest_at(&self, p: usize) -> &str {
        self.src.get(p..).unwrap_or("")
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(is_ws) {
            self.pos += 1;
        }
    }

    fn last_terminates_term(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.kind.terminates_term())
    }

    /// Insert an implicit `AND` when whitespace separates two terms. The
    /// synthesized token's lexeme is the whitespace itself.
    fn maybe_implicit_and(&mut self, ws_start: usize, had_ws: bool) {
        if !had_ws || self.in_list || !self.last_terminates_term() {
            return;
        }
        let lexeme = &self.src[ws_start..self.pos];
        self.tokens.push(Token::new(
            TokenKind::And,
            lexeme,
            Some("and".to_string()),
            Span::new(ws_start, lexeme.len()),
        ));
    }

    fn push_byte(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.pos += 1;
        self.push_span(kind, start);
    }

    fn push_span(&mut self, kind: TokenKind, start: usize) {
        let lexeme = &self.src[start..self.pos];
        self.tokens.push(Token::new(
            kind,
            lexeme,
            None,
            Span::new(start, lexeme.len()),
        ));
    }

    fn unexpected_char(&self) -> LexError {
        let ch = self.src[self.pos..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        LexError::UnexpectedChar { ch, pos: self.pos }
    }
}

// ============ Identifier normalization ============

/// Snake-case a field path, segment by segment: underscores are inserted at
/// lower/digit to UPPER transitions only (acronyms stay joined), dashes and
/// spaces map to underscores, runs of underscores collapse, everything is
/// lowercased. Idempotent.
pub fn to_snake(path: &str) -> String {
    path.split('.')
        .map(snake_segment)
        .collect::<Vec<_>>()
        .join(".")
}

fn snake_segment(seg: &str) -> String {
    let mut out = String::with_capacity(seg.len() + 4);
    let mut prev_lower_or_digit = false;

    for ch in seg.chars() {
        let mapped = if ch == '-' || ch == ' ' { '_' } else { ch };
        if mapped == '_' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else if mapped.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(mapped.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(mapped);
            prev_lower_or_digit = mapped.is_ascii_lowercase() || mapped.is_ascii_digit();
        }
    }
    out
}

// ============ Sanity tests ============
// Black-box coverage lives in tests/integration.rs.

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_predicate() {
        let tokens = scan("status:live").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Field,
                TokenKind::Eq,
                TokenKind::Value { quoted: false },
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[0].literal.as_deref(), Some("status"));
        assert_eq!(tokens[2].literal.as_deref(), Some("live"));
    }

    #[test]
    fn spans_cover_source() {
        let src = "status:live AND name:bob";
        let tokens = scan(src).unwrap();
        let mut last_end = 0;
        for t in &tokens {
            assert!(t.span.offset >= last_end, "overlapping span: {t:?}");
            assert!(t.span.end() <= src.len());
            last_end = t.span.end();
        }
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn implicit_and_between_terms() {
        let tokens = scan("hello world").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::Value { quoted: false },
                TokenKind::Eof
            ]
        );
        // the connector spans the whitespace
        assert_eq!(tokens[1].lexeme, " ");
        assert_eq!(tokens[1].literal.as_deref(), Some("and"));
        assert_eq!(tokens[1].span, Span::new(5, 1));
    }

    #[test]
    fn implicit_and_before_paren_and_not() {
        assert_eq!(
            kinds("a (b)"),
            vec![
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::LParen,
                TokenKind::Value { quoted: false },
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a -b"),
            vec![
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::Not,
                TokenKind::Value { quoted: false },
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn no_implicit_and_around_connectors() {
        assert_eq!(
            kinds("a AND b"),
            vec![
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::Value { quoted: false },
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lowercase_connectors_are_values() {
        assert_eq!(
            kinds("a and b"),
            vec![
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::Value { quoted: false },
                TokenKind::And,
                TokenKind::Value { quoted: false },
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn set_operators() {
        assert_eq!(
            kinds("status IN (live, draft)"),
            vec![
                TokenKind::Field,
                TokenKind::In,
                TokenKind::LParen,
                TokenKind::Value { quoted: false },
                TokenKind::Comma,
                TokenKind::Value { quoted: false },
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("x NOT IN (a)")[1], TokenKind::NotIn);
        assert_eq!(kinds("x ALL (a)")[1], TokenKind::All);
    }

    #[test]
    fn set_keyword_must_be_exact() {
        // lowercase / glued / extended keywords fall through to bare terms
        assert_eq!(kinds("status in (a)")[0], TokenKind::Value { quoted: false });
        assert_eq!(kinds("status IN(a)")[0], TokenKind::Value { quoted: false });
        let tokens = scan("status INDEX (a)").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Value { quoted: false });
        assert_eq!(tokens[2].lexeme, "INDEX");
    }

    #[test]
    fn no_implicit_and_inside_lists() {
        assert_eq!(
            kinds("x IN (a b)"),
            vec![
                TokenKind::Field,
                TokenKind::In,
                TokenKind::LParen,
                TokenKind::Value { quoted: false },
                TokenKind::Value { quoted: false },
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn relational_operators() {
        assert_eq!(kinds("a<1")[1], TokenKind::Lt);
        assert_eq!(kinds("a<=1")[1], TokenKind::Lte);
        assert_eq!(kinds("a>1")[1], TokenKind::Gt);
        assert_eq!(kinds("a>=1")[1], TokenKind::Gte);
    }

    #[test]
    fn broken_operator() {
        let err = scan("a< =1").unwrap_err();
        assert!(matches!(err, LexError::BrokenOperator { .. }), "{err:?}");
    }

    #[test]
    fn standalone_equals_is_invalid() {
        let err = scan("status=live").unwrap_err();
        assert_eq!(err.to_string(), "Invalid operator '=' at position 6");
    }

    #[test]
    fn spacing_around_operator() {
        assert_eq!(
            scan("status : live").unwrap_err(),
            LexError::InvalidPredicateSpacing(6)
        );
        assert_eq!(
            scan("status: live").unwrap_err(),
            LexError::InvalidPredicateSpacing(7)
        );
    }

    #[test]
    fn quoted_strings() {
        let tokens = scan(r#"status:'with space'"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Value { quoted: true });
        assert_eq!(tokens[2].literal.as_deref(), Some("with space"));

        // escapes take the next character literally
        let tokens = scan(r#""a\'b\nc""#).unwrap();
        assert_eq!(tokens[0].literal.as_deref(), Some("a'bnc"));
    }

    #[test]
    fn unterminated_string() {
        let err = scan("status:'unterminated").unwrap_err();
        assert_eq!(err.to_string(), "Unterminated string at position 7");
    }

    #[test]
    fn field_paths() {
        let tokens = scan("org.name:x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Field);
        assert_eq!(tokens[0].literal.as_deref(), Some("org.name"));
    }

    #[test]
    fn invalid_field_trailing_dot() {
        assert!(matches!(
            scan("foo.:x").unwrap_err(),
            LexError::InvalidField { .. }
        ));
        assert!(matches!(
            scan("foo.1:x").unwrap_err(),
            LexError::InvalidField { .. }
        ));
    }

    #[test]
    fn bare_values_keep_punctuation() {
        let tokens = scan("time:2025-08-07").unwrap();
        assert_eq!(tokens[2].literal.as_deref(), Some("2025-08-07"));

        let tokens = scan("3.14").unwrap();
        assert_eq!(tokens[0].literal.as_deref(), Some("3.14"));
    }

    #[test]
    fn star_degrades_identifier_to_value() {
        let tokens = scan("name:Bea*").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Value { quoted: false });
        assert_eq!(tokens[2].literal.as_deref(), Some("Bea*"));
    }

    #[test]
    fn not_forms() {
        assert_eq!(kinds("NOT a")[0], TokenKind::Not);
        assert_eq!(kinds("-a")[0], TokenKind::Not);
        // NOT without trailing whitespace is a bare value
        assert_eq!(kinds("NOT")[0], TokenKind::Value { quoted: false });
    }

    #[test]
    fn snake_case_normalization() {
        assert_eq!(to_snake("fooBar"), "foo_bar");
        assert_eq!(to_snake("FooBar"), "foo_bar");
        assert_eq!(to_snake("HTTPServer"), "httpserver");
        assert_eq!(to_snake("NOTAPI"), "notapi");
        assert_eq!(to_snake("foo-bar"), "foo_bar");
        assert_eq!(to_snake("foo__bar"), "foo_bar");
        assert_eq!(to_snake("org.displayName"), "org.display_name");
        assert_eq!(to_snake("foo2Bar"), "foo2_bar");
    }

    #[test]
    fn snake_case_is_idempotent() {
        for s in ["fooBar", "HTTPServer", "a-b-c", "org.displayName"] {
            let once = to_snake(s);
            assert_eq!(to_snake(&once), once);
        }
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }
}
