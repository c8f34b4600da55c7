//! Canonical printing for the AST.
//!
//! `Display` renders a query that re-parses to the same tree (modulo
//! connector flattening, which the smart constructors already apply).

use std::fmt::{self, Display};

use crate::ast::{Cmp, CmpOp, CmpValue, Node, Value};

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    // OR binds looser than AND, so it needs parens here
                    if matches!(child, Node::Or(_)) {
                        write!(f, "({child})")?;
                    } else {
                        write!(f, "{child}")?;
                    }
                }
                Ok(())
            }
            Node::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Node::Not(inner) => {
                if matches!(inner.as_ref(), Node::And(_) | Node::Or(_)) {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            Node::Cmp(cmp) => cmp.fmt(f),
            Node::FullText { term } => write!(f, "{}", bare_or_quoted(term)),
        }
    }
}

impl Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.join(".");
        match (&self.op, &self.value) {
            (CmpOp::Eq, CmpValue::One(v)) => write!(f, "{path}:{}", scalar(v)),
            // no surface syntax for `!=`; print the equivalent negation
            (CmpOp::Neq, CmpValue::One(v)) => write!(f, "NOT {path}:{}", scalar(v)),
            (CmpOp::StartsWith, CmpValue::One(Value::Str(base))) => {
                write!(f, "{path}:{base}*")
            }
            (CmpOp::EndsWith, CmpValue::One(Value::Str(base))) => {
                write!(f, "{path}:*{base}")
            }
            (CmpOp::Gt, CmpValue::One(v)) => write!(f, "{path}>{}", scalar(v)),
            (CmpOp::Gte, CmpValue::One(v)) => write!(f, "{path}>={}", scalar(v)),
            (CmpOp::Lt, CmpValue::One(v)) => write!(f, "{path}<{}", scalar(v)),
            (CmpOp::Lte, CmpValue::One(v)) => write!(f, "{path}<={}", scalar(v)),
            (CmpOp::In, CmpValue::Many(items)) => write_list(f, &path, "IN", items),
            (CmpOp::Nin, CmpValue::Many(items)) => write_list(f, &path, "NOT IN", items),
            (CmpOp::ContainsAll, CmpValue::Many(items)) => write_list(f, &path, "ALL", items),
            // shape mismatches cannot come out of the parser
            (op, value) => write!(f, "{path} {op:?} {value:?}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, path: &str, kw: &str, items: &[Value]) -> fmt::Result {
    write!(f, "{path} {kw} (")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", scalar(item))?;
    }
    write!(f, ")")
}

fn scalar(v: &Value) -> String {
    match v {
        Value::Null => "NULL".to_string(),
        Value::Str(s) => bare_or_quoted(s),
    }
}

/// Quote a value unless it survives rescanning as the same bare term.
fn bare_or_quoted(s: &str) -> String {
    if needs_quotes(s) {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('"');
        for ch in s.chars() {
            if ch == '"' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
        out
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s.starts_with('-') {
        return true;
    }
    if matches!(s, "AND" | "OR" | "NOT" | "NULL") {
        return true;
    }
    s.bytes().any(|b| {
        b <= 0x20
            || b == 0x7f
            || matches!(
                b,
                b'(' | b')' | b':' | b'<' | b'>' | b'=' | b',' | b'\'' | b'"' | b'*'
            )
    })
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;
    use crate::scan::scan;

    use super::*;

    fn roundtrip(src: &str) {
        let node = parse(&scan(src).unwrap()).unwrap();
        let printed = node.to_string();
        let reparsed = parse(&scan(&printed).unwrap())
            .unwrap_or_else(|e| panic!("pretty output failed to reparse: {printed:?}: {e}"));
        assert_eq!(node, reparsed, "round trip failed for {src:?} -> {printed:?}");
    }

    #[test]
    fn display_simple() {
        let node = parse(&scan("status:live").unwrap()).unwrap();
        assert_eq!(node.to_string(), "status:live");
    }

    #[test]
    fn display_precedence() {
        let node = parse(&scan("a:1 OR b:2 AND c:3").unwrap()).unwrap();
        assert_eq!(node.to_string(), "a:1 OR b:2 AND c:3");

        let node = parse(&scan("(a:1 OR b:2) AND c:3").unwrap()).unwrap();
        assert_eq!(node.to_string(), "(a:1 OR b:2) AND c:3");
    }

    #[test]
    fn display_quotes_when_needed() {
        let node = parse(&scan("name:'two words'").unwrap()).unwrap();
        assert_eq!(node.to_string(), "name:\"two words\"");
    }

    #[test]
    fn display_null_and_lists() {
        let node = parse(&scan("org IN (NULL, 7)").unwrap()).unwrap();
        assert_eq!(node.to_string(), "org IN (NULL, 7)");

        // the string "NULL" stays quoted
        let node = parse(&scan("org:'NULL'").unwrap()).unwrap();
        assert_eq!(node.to_string(), "org:\"NULL\"");
    }

    #[test]
    fn display_wildcards() {
        let node = parse(&scan("name:Bea*").unwrap()).unwrap();
        assert_eq!(node.to_string(), "name:Bea*");
        let node = parse(&scan("name:*son").unwrap()).unwrap();
        assert_eq!(node.to_string(), "name:*son");
        // quoted star stays a quoted literal
        let node = parse(&scan("name:'*son'").unwrap()).unwrap();
        assert_eq!(node.to_string(), "name:\"*son\"");
    }

    #[test]
    fn roundtrips() {
        for src in [
            "status:live",
            "status:live AND priority>3",
            "a:1 OR b:2 AND c:3",
            "(a:1 OR b:2) AND c:3",
            "NOT status:live",
            "NOT (a:1 OR b:2)",
            "status IN (live, draft)",
            "tags.name ALL (urgent, billing)",
            "org NOT IN (NULL, 7)",
            "full text search status:published",
            "name:*son AND name:Bea*",
            "time<=2025-01-01",
            "'quoted phrase' AND x:y",
        ] {
            roundtrip(src);
        }
    }

    #[test]
    fn empty_tree_prints_empty() {
        let node = parse(&scan("").unwrap()).unwrap();
        assert_eq!(node.to_string(), "");
        roundtrip("");
    }
}
