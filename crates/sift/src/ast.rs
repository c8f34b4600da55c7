//! Typed AST produced by the parser and consumed by the builder.
//!
//! Boolean nodes are kept flat: an `And` never holds an `And` child and an
//! `Or` never holds an `Or` child. The smart constructors [`Node::and`] and
//! [`Node::or`] maintain that invariant.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
    Cmp(Cmp),
    /// A bare or quoted search term.
    FullText { term: String },
}

/// A structured predicate: `field_path op value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cmp {
    /// Dot-separated field path, snake-cased, never empty.
    pub path: Vec<String>,
    pub op: CmpOp,
    pub value: CmpValue,
}

impl Cmp {
    pub fn new(path: Vec<String>, op: CmpOp, value: CmpValue) -> Self {
        Self { path, op, value }
    }

    pub fn path_str(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    /// No surface syntax; reachable from programmatic ASTs only.
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    /// `ALL (...)`: every listed value must be present.
    ContainsAll,
    /// `field:base*`
    StartsWith,
    /// `field:*base`
    EndsWith,
}

impl CmpOp {
    pub fn is_ordering(&self) -> bool {
        matches!(self, CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, CmpOp::In | CmpOp::Nin | CmpOp::ContainsAll)
    }
}

/// A scalar literal. `Null` is first-class and means SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Str(String),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpValue {
    One(Value),
    Many(Vec<Value>),
}

impl Node {
    /// Join two nodes with `and`, splicing existing `And` children flat.
    pub fn and(lhs: Node, rhs: Node) -> Node {
        let mut children = match lhs {
            Node::And(cs) => cs,
            other => vec![other],
        };
        match rhs {
            Node::And(cs) => children.extend(cs),
            other => children.push(other),
        }
        Node::And(children)
    }

    /// Join two nodes with `or`, splicing existing `Or` children flat.
    pub fn or(lhs: Node, rhs: Node) -> Node {
        let mut children = match lhs {
            Node::Or(cs) => cs,
            other => vec![other],
        };
        match rhs {
            Node::Or(cs) => children.extend(cs),
            other => children.push(other),
        }
        Node::Or(children)
    }

    /// True for the empty tree (`And` with no children).
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::And(cs) if cs.is_empty())
    }
}
