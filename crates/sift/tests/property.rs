//! Property tests over the scanner, parser, and compiler invariants.

use proptest::prelude::*;
use sift::{
    compile, parse, scan, to_snake, CompileOptions, FieldType, SchemaCatalog, SchemaDef,
    TokenKind,
};

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_schema(
            "events",
            SchemaDef::new("events")
                .field("status", FieldType::Text)
                .field("priority", FieldType::Integer)
                .field("time_start", FieldType::UtcDatetime)
                .belongs_to("organization", "organizations", "organization_id", "id"),
        )
        .with_schema(
            "organizations",
            SchemaDef::new("organizations").field("name", FieldType::Text),
        )
}

// ============ Generators ============

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

// value position: dots and dashes are plain bytes there
fn arb_bare_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9_.-]{0,10}"
}

// term position: identifier-shaped so the scanner never sees a malformed
// field path, lowercase so it never collides with a keyword
fn arb_bare_term() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}"
}

fn arb_predicate() -> impl Strategy<Value = String> {
    (
        arb_ident(),
        prop_oneof![
            Just(":"),
            Just("<"),
            Just("<="),
            Just(">"),
            Just(">="),
        ],
        arb_bare_value(),
    )
        .prop_map(|(field, op, value)| format!("{field}{op}{value}"))
}

fn arb_term() -> impl Strategy<Value = String> {
    prop_oneof![arb_predicate(), arb_bare_term()]
}

fn arb_query(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        return arb_term().boxed();
    }
    let leaf = arb_term();
    let nested = (
        arb_query(depth - 1),
        prop_oneof![Just(" AND "), Just(" OR "), Just(" ")],
        arb_query(depth - 1),
    )
        .prop_map(|(lhs, op, rhs)| format!("({lhs}){op}({rhs})"));
    prop_oneof![leaf, nested].boxed()
}

// ============ Properties ============

proptest! {
    #[test]
    fn snake_case_is_idempotent(s in "[a-zA-Z0-9_. -]{0,24}") {
        let once = to_snake(&s);
        prop_assert_eq!(to_snake(&once), once);
    }

    #[test]
    fn spans_are_monotone_and_in_bounds(query in arb_query(3)) {
        let tokens = scan(&query).expect("generated query should scan");
        let mut last_end = 0;
        for token in &tokens {
            prop_assert!(token.span.offset >= last_end);
            prop_assert!(token.span.end() <= query.len());
            last_end = token.span.end();
        }
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        prop_assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
    }

    #[test]
    fn implicit_and_sits_between_terms(query in arb_query(3)) {
        let tokens = scan(&query).expect("generated query should scan");
        for window in tokens.windows(2) {
            // no two adjacent connectors
            let both_connectors = matches!(window[0].kind, TokenKind::And | TokenKind::Or)
                && matches!(window[1].kind, TokenKind::And | TokenKind::Or);
            prop_assert!(!both_connectors, "adjacent connectors in {query:?}");
        }
    }

    #[test]
    fn boolean_nodes_stay_flat(query in arb_query(3)) {
        fn check(node: &sift::Node) {
            match node {
                sift::Node::And(children) => {
                    for child in children {
                        assert!(!matches!(child, sift::Node::And(_)), "And inside And");
                        check(child);
                    }
                }
                sift::Node::Or(children) => {
                    for child in children {
                        assert!(!matches!(child, sift::Node::Or(_)), "Or inside Or");
                        check(child);
                    }
                }
                sift::Node::Not(inner) => check(inner),
                _ => {}
            }
        }
        let node = parse(&scan(&query).expect("scan")).expect("parse");
        check(&node);
    }

    #[test]
    fn pretty_print_roundtrips(query in arb_query(3)) {
        let node = parse(&scan(&query).expect("scan")).expect("parse");
        let printed = node.to_string();
        let reparsed = parse(&scan(&printed).expect("pretty output should scan"))
            .expect("pretty output should parse");
        prop_assert_eq!(node, reparsed);
    }

    #[test]
    fn compilation_is_deterministic(query in arb_query(2)) {
        let catalog = catalog();
        let opts = CompileOptions::new("events")
            .with_search_fields(vec!["status".to_string()]);
        let a = compile(&query, &catalog, &opts);
        let b = compile(&query, &catalog, &opts);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.to_sql(), b.to_sql());
                prop_assert_eq!(a.params, b.params);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            (a, b) => prop_assert!(false, "nondeterministic outcome: {a:?} vs {b:?}"),
        }
    }
}
