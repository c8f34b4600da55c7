//! Parser for the filter grammar.
//!
//! Precedence climbing over the token stream: `AND` binds at 20, `OR` at
//! 10, both left-associative. `NOT` is a prefix that binds to the
//! immediately following term. Produces the flattened [`Node`] AST.

use thiserror::Error;

use crate::ast::{Cmp, CmpOp, CmpValue, Node, Value};
use crate::token::{Token, TokenKind};

const PREC_AND: u8 = 20;
const PREC_OR: u8 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected token '{lexeme}' at position {pos}")]
    UnexpectedToken { lexeme: String, pos: usize },

    #[error("Expected expression after '{op}' at position {pos}. Operators must be followed by a value or field.")]
    UnexpectedEofAfterOperator { op: String, pos: usize },

    #[error("Expected value after '{op}' at position {pos}. Comparison operators must be followed by a value.")]
    MissingRhs { op: String, pos: usize },

    #[error("Missing closing parenthesis ')' for opening parenthesis at position {0}")]
    MissingRightParen(usize),

    #[error("Empty group at position {0}. Parentheses must contain an expression.")]
    EmptyGroup(usize),

    #[error("Unexpected ')' after '{op}' at position {pos}")]
    OperatorBeforeRightParen { op: String, pos: usize },

    #[error("Expected list after '{op}' at position {pos}. Set operators must be followed by a parenthesized list.")]
    ExpectedListAfterSetOperator { op: String, pos: usize },

    #[error("Empty list at position {0}. Lists must contain at least one value.")]
    EmptyList(usize),

    #[error("Trailing comma at position {0}. Remove the comma after the last list item.")]
    TrailingCommaInList(usize),

    #[error("Missing comma between list items at position {0}")]
    MissingCommaInList(usize),

    #[error("Lists are not allowed with ':' at position {0}. Use the IN operator instead.")]
    ListNotAllowedForColonOp(usize),

    #[error("Invalid wildcard position in '{lexeme}' at position {pos}. '*' may only lead or trail a value.")]
    InvalidWildcardPosition { lexeme: String, pos: usize },

    #[error("Wildcards are not allowed with relational operators (position {0})")]
    WildcardNotAllowedForRelop(usize),

    #[error("Wildcards are not allowed inside lists (position {0})")]
    WildcardNotAllowedInList(usize),

    #[error("Expected expression after 'NOT' at position {0}")]
    NotWithoutTerm(usize),

    #[error("Unexpected ',' at position {0}")]
    StrayComma(usize),

    #[error("Token '{lexeme}' cannot start an expression (position {pos})")]
    UnrecognizedToken { lexeme: String, pos: usize },
}

impl ParseError {
    /// Byte offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            ParseError::MissingRightParen(pos)
            | ParseError::EmptyGroup(pos)
            | ParseError::EmptyList(pos)
            | ParseError::TrailingCommaInList(pos)
            | ParseError::MissingCommaInList(pos)
            | ParseError::ListNotAllowedForColonOp(pos)
            | ParseError::WildcardNotAllowedForRelop(pos)
            | ParseError::WildcardNotAllowedInList(pos)
            | ParseError::NotWithoutTerm(pos)
            | ParseError::StrayComma(pos) => *pos,
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::UnexpectedEofAfterOperator { pos, .. }
            | ParseError::MissingRhs { pos, .. }
            | ParseError::OperatorBeforeRightParen { pos, .. }
            | ParseError::ExpectedListAfterSetOperator { pos, .. }
            | ParseError::InvalidWildcardPosition { pos, .. }
            | ParseError::UnrecognizedToken { pos, .. } => *pos,
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a token stream (as produced by [`crate::scan`]) into an AST.
/// An empty stream parses to the empty tree `And([])`.
pub fn parse(tokens: &[Token]) -> Result<Node> {
    if tokens.is_empty() {
        return Ok(Node::And(Vec::new()));
    }
    let mut p = Parser { tokens, pos: 0 };
    if p.peek().kind == TokenKind::Eof {
        return Ok(Node::And(Vec::new()));
    }
    let node = p.expr(0, None)?;
    let t = p.peek();
    match t.kind {
        TokenKind::Eof => Ok(node),
        TokenKind::Comma => Err(ParseError::StrayComma(t.span.offset)),
        _ => Err(ParseError::UnexpectedToken {
            lexeme: t.lexeme.clone(),
            pos: t.span.offset,
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &'a Token {
        // the scanner guarantees a trailing Eof token
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let t = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// Precedence climbing. `pending` is the connector whose right-hand side
    /// is being parsed, used to attribute errors to the operator.
    fn expr(&mut self, min_prec: u8, pending: Option<&Token>) -> Result<Node> {
        let mut lhs = self.prefix(pending)?;
        loop {
            let (is_and, prec) = match self.peek().kind {
                TokenKind::And => (true, PREC_AND),
                TokenKind::Or => (false, PREC_OR),
                _ => break,
            };
            if prec < min_prec {
                break;
            }
            let op = self.advance();
            let rhs = self.expr(prec + 1, Some(op))?;
            lhs = if is_and {
                Node::and(lhs, rhs)
            } else {
                Node::or(lhs, rhs)
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self, pending: Option<&Token>) -> Result<Node> {
        let t = self.peek();
        match t.kind {
            TokenKind::Value { .. } => {
                let t = self.advance();
                Ok(Node::FullText {
                    term: t.literal_str().to_string(),
                })
            }
            TokenKind::Field => self.predicate(),
            TokenKind::Not => {
                let not = self.advance();
                let next = self.peek();
                match next.kind {
                    TokenKind::Eof => Err(ParseError::NotWithoutTerm(not.span.offset)),
                    TokenKind::RParen => Err(ParseError::OperatorBeforeRightParen {
                        op: not.lexeme.clone(),
                        pos: next.span.offset,
                    }),
                    _ => Ok(Node::Not(Box::new(self.prefix(Some(not))?))),
                }
            }
            TokenKind::LParen => {
                let open = self.advance();
                if self.peek().kind == TokenKind::RParen {
                    return Err(ParseError::EmptyGroup(open.span.offset));
                }
                let inner = self.expr(0, None)?;
                let close = self.peek();
                match close.kind {
                    TokenKind::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    TokenKind::Eof => Err(ParseError::MissingRightParen(open.span.offset)),
                    TokenKind::Comma => Err(ParseError::StrayComma(close.span.offset)),
                    _ => Err(ParseError::UnexpectedToken {
                        lexeme: close.lexeme.clone(),
                        pos: close.span.offset,
                    }),
                }
            }
            TokenKind::RParen => match pending {
                Some(op) => Err(ParseError::OperatorBeforeRightParen {
                    op: op.lexeme.clone(),
                    pos: t.span.offset,
                }),
                None => Err(ParseError::UnexpectedToken {
                    lexeme: t.lexeme.clone(),
                    pos: t.span.offset,
                }),
            },
            TokenKind::Eof => match pending {
                Some(op) => Err(ParseError::UnexpectedEofAfterOperator {
                    op: op.lexeme.clone(),
                    pos: op.span.offset,
                }),
                None => Err(ParseError::UnexpectedToken {
                    lexeme: String::new(),
                    pos: t.span.offset,
                }),
            },
            TokenKind::Comma => Err(ParseError::StrayComma(t.span.offset)),
            TokenKind::And | TokenKind::Or => Err(ParseError::UnexpectedToken {
                lexeme: t.lexeme.clone(),
                pos: t.span.offset,
            }),
            _ => Err(ParseError::UnrecognizedToken {
                lexeme: t.lexeme.clone(),
                pos: t.span.offset,
            }),
        }
    }

    // ============ Predicates ============

    fn predicate(&mut self) -> Result<Node> {
        let field = self.advance();
        let path: Vec<String> = field
            .literal_str()
            .split('.')
            .map(str::to_string)
            .collect();

        let op = self.advance();
        match op.kind {
            TokenKind::Eq => self.eq_rhs(path, op),
            TokenKind::Lt => self.rel_rhs(path, CmpOp::Lt, op),
            TokenKind::Lte => self.rel_rhs(path, CmpOp::Lte, op),
            TokenKind::Gt => self.rel_rhs(path, CmpOp::Gt, op),
            TokenKind::Gte => self.rel_rhs(path, CmpOp::Gte, op),
            TokenKind::In => self.set_rhs(path, CmpOp::In, op),
            TokenKind::NotIn => self.set_rhs(path, CmpOp::Nin, op),
            TokenKind::All => self.set_rhs(path, CmpOp::ContainsAll, op),
            // the scanner only emits Field glued to an operator
            _ => Err(ParseError::UnexpectedToken {
                lexeme: op.lexeme.clone(),
                pos: op.span.offset,
            }),
        }
    }

    /// Right-hand side of `:`. Unquoted values classify wildcards and the
    /// NULL literal; quoted values are taken verbatim.
    fn eq_rhs(&mut self, path: Vec<String>, op: &Token) -> Result<Node> {
        let t = self.peek();
        match t.kind {
            TokenKind::Value { quoted } => {
                let t = self.advance();
                let lit = t.literal_str();
                if quoted {
                    return Ok(Node::Cmp(Cmp::new(
                        path,
                        CmpOp::Eq,
                        CmpValue::One(Value::Str(lit.to_string())),
                    )));
                }
                let (op, value) = classify_eq_value(lit, t)?;
                Ok(Node::Cmp(Cmp::new(path, op, CmpValue::One(value))))
            }
            TokenKind::LParen => Err(ParseError::ListNotAllowedForColonOp(t.span.offset)),
            TokenKind::RParen => Err(ParseError::OperatorBeforeRightParen {
                op: op.lexeme.clone(),
                pos: t.span.offset,
            }),
            TokenKind::Eof => Err(ParseError::MissingRhs {
                op: op.lexeme.clone(),
                pos: op.span.offset,
            }),
            _ => Err(ParseError::UnexpectedToken {
                lexeme: t.lexeme.clone(),
                pos: t.span.offset,
            }),
        }
    }

    fn rel_rhs(&mut self, path: Vec<String>, cmp_op: CmpOp, op: &Token) -> Result<Node> {
        let t = self.peek();
        match t.kind {
            TokenKind::Value { quoted } => {
                let t = self.advance();
                let lit = t.literal_str();
                if !quoted && lit.contains('*') {
                    return Err(ParseError::WildcardNotAllowedForRelop(t.span.offset));
                }
                let value = if !quoted && lit == "NULL" {
                    Value::Null
                } else {
                    Value::Str(lit.to_string())
                };
                Ok(Node::Cmp(Cmp::new(path, cmp_op, CmpValue::One(value))))
            }
            TokenKind::RParen => Err(ParseError::OperatorBeforeRightParen {
                op: op.lexeme.clone(),
                pos: t.span.offset,
            }),
            TokenKind::Eof => Err(ParseError::MissingRhs {
                op: op.lexeme.clone(),
                pos: op.span.offset,
            }),
            _ => Err(ParseError::UnexpectedToken {
                lexeme: t.lexeme.clone(),
                pos: t.span.offset,
            }),
        }
    }

    // ============ Lists ============

    fn set_rhs(&mut self, path: Vec<String>, cmp_op: CmpOp, op: &Token) -> Result<Node> {
        let open = self.peek();
        if open.kind != TokenKind::LParen {
            return Err(ParseError::ExpectedListAfterSetOperator {
                op: op.lexeme.clone(),
                pos: op.span.offset,
            });
        }
        let open = self.advance();
        if self.peek().kind == TokenKind::RParen {
            return Err(ParseError::EmptyList(open.span.offset));
        }

        let mut items = Vec::new();
        loop {
            let t = self.peek();
            match t.kind {
                TokenKind::Value { quoted } => {
                    let t = self.advance();
                    let lit = t.literal_str();
                    if !quoted && lit.contains('*') {
                        return Err(ParseError::WildcardNotAllowedInList(t.span.offset));
                    }
                    items.push(if !quoted && lit == "NULL" {
                        Value::Null
                    } else {
                        Value::Str(lit.to_string())
                    });

                    let sep = self.peek();
                    match sep.kind {
                        TokenKind::Comma => {
                            let comma = self.advance();
                            match self.peek().kind {
                                TokenKind::RParen => {
                                    return Err(ParseError::TrailingCommaInList(
                                        comma.span.offset,
                                    ));
                                }
                                TokenKind::Eof => {
                                    return Err(ParseError::MissingRightParen(open.span.offset));
                                }
                                _ => continue,
                            }
                        }
                        TokenKind::RParen => {
                            self.advance();
                            break;
                        }
                        TokenKind::Value { .. } => {
                            return Err(ParseError::MissingCommaInList(sep.span.offset));
                        }
                        TokenKind::Eof => {
                            return Err(ParseError::MissingRightParen(open.span.offset));
                        }
                        _ => {
                            return Err(ParseError::UnexpectedToken {
                                lexeme: sep.lexeme.clone(),
                                pos: sep.span.offset,
                            });
                        }
                    }
                }
                TokenKind::Comma => return Err(ParseError::StrayComma(t.span.offset)),
                TokenKind::Eof => return Err(ParseError::MissingRightParen(open.span.offset)),
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        lexeme: t.lexeme.clone(),
                        pos: t.span.offset,
                    });
                }
            }
        }

        Ok(Node::Cmp(Cmp::new(path, cmp_op, CmpValue::Many(items))))
    }
}

/// Classify the unquoted right-hand side of `:`: wildcard prefix/suffix
/// forms, the NULL literal, or plain equality.
fn classify_eq_value(lit: &str, token: &Token) -> Result<(CmpOp, Value)> {
    let stars = lit.matches('*').count();
    if stars == 0 {
        if lit == "NULL" {
            return Ok((CmpOp::Eq, Value::Null));
        }
        return Ok((CmpOp::Eq, Value::Str(lit.to_string())));
    }
    if stars == 1 && lit.starts_with('*') {
        return Ok((CmpOp::EndsWith, Value::Str(lit[1..].to_string())));
    }
    if stars == 1 && lit.ends_with('*') {
        return Ok((CmpOp::StartsWith, Value::Str(lit[..lit.len() - 1].to_string())));
    }
    Err(ParseError::InvalidWildcardPosition {
        lexeme: token.lexeme.clone(),
        pos: token.span.offset,
    })
}

// ============ Sanity tests ============
// Black-box coverage lives in tests/integration.rs.
