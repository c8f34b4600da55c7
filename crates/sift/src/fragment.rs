//! Parameterized SQL fragments.
//!
//! Placeholders are numbered PostgreSQL-style (`$1, $2, ...`) through a
//! [`Binder`] that hands out the next index as parameters are pushed, so the
//! parameter vector always lines up with the emitted text.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A bind parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Null,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Param::Int(n) => write!(f, "{n}"),
            Param::Float(n) => write!(f, "{n}"),
            Param::Bool(b) => write!(f, "{b}"),
            Param::Decimal(d) => write!(f, "{d}"),
            Param::Date(d) => write!(f, "'{d}'"),
            Param::Timestamp(t) => write!(f, "'{}'", t.format("%Y-%m-%dT%H:%M:%S")),
            Param::TimestampTz(t) => write!(f, "'{}'", t.format("%Y-%m-%dT%H:%M:%SZ")),
            Param::Null => write!(f, "NULL"),
        }
    }
}

/// Hands out `$N` placeholders and accumulates the parameter vector.
#[derive(Debug, Default)]
pub struct Binder {
    params: Vec<Param>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one parameter, returning its placeholder.
    pub fn push(&mut self, param: Param) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    /// Bind a run of parameters, returning `"$1, $2, ..."`.
    pub fn push_list(&mut self, params: impl IntoIterator<Item = Param>) -> String {
        let mut placeholders = Vec::new();
        for p in params {
            placeholders.push(self.push(p));
        }
        placeholders.join(", ")
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_params(self) -> Vec<Param> {
        self.params
    }
}

/// A piece of SQL condition text. `composite` marks fragments whose
/// top-level operator is `AND`/`OR`, which need parentheses when embedded
/// in a larger expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    sql: String,
    composite: bool,
}

impl Fragment {
    /// A fragment that never needs wrapping.
    pub fn atom(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            composite: false,
        }
    }

    /// A fragment with a top-level `AND`/`OR`.
    pub fn composite(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            composite: true,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn embedded(&self) -> Cow<'_, str> {
        if self.composite {
            Cow::Owned(format!("({})", self.sql))
        } else {
            Cow::Borrowed(&self.sql)
        }
    }

    /// Conjoin fragments. Empty input yields `None`; a single fragment
    /// passes through unchanged.
    pub fn all(frags: Vec<Fragment>) -> Option<Fragment> {
        Self::join(frags, " AND ")
    }

    /// Disjoin fragments.
    pub fn any(frags: Vec<Fragment>) -> Option<Fragment> {
        Self::join(frags, " OR ")
    }

    fn join(mut frags: Vec<Fragment>, sep: &str) -> Option<Fragment> {
        match frags.len() {
            0 => None,
            1 => frags.pop(),
            _ => Some(Fragment::composite(
                frags
                    .iter()
                    .map(|f| f.embedded())
                    .collect::<Vec<_>>()
                    .join(sep),
            )),
        }
    }

    pub fn negate(self) -> Fragment {
        Fragment::atom(format!("NOT ({})", self.sql))
    }
}

/// One planned join. All joins the compiler emits are LEFT joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPlan {
    pub table: String,
    /// Alias the joined table is referenced by; join tables go unaliased.
    pub alias: Option<String>,
    /// Raw ON condition.
    pub on: String,
}

impl JoinPlan {
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) if alias != &self.table => {
                format!("LEFT JOIN {} AS {} ON {}", self.table, alias, self.on)
            }
            _ => format!("LEFT JOIN {} ON {}", self.table, self.on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binder_numbers_params() {
        let mut b = Binder::new();
        assert_eq!(b.push(Param::Int(1)), "$1");
        assert_eq!(b.push(Param::Str("x".into())), "$2");
        assert_eq!(
            b.push_list([Param::Int(2), Param::Int(3)]),
            "$3, $4"
        );
        assert_eq!(b.into_params().len(), 4);
    }

    #[test]
    fn all_and_any_compose_with_parens() {
        let or = Fragment::any(vec![
            Fragment::atom("a = $1"),
            Fragment::atom("b = $2"),
        ])
        .unwrap();
        assert_eq!(or.sql(), "a = $1 OR b = $2");

        let and = Fragment::all(vec![or, Fragment::atom("c = $3")]).unwrap();
        assert_eq!(and.sql(), "(a = $1 OR b = $2) AND c = $3");
    }

    #[test]
    fn single_fragment_passes_through() {
        let f = Fragment::all(vec![Fragment::atom("a = $1")]).unwrap();
        assert_eq!(f.sql(), "a = $1");
        assert!(Fragment::all(vec![]).is_none());
    }

    #[test]
    fn negation_wraps() {
        let f = Fragment::atom("a = $1").negate();
        assert_eq!(f.sql(), "NOT (a = $1)");
    }

    #[test]
    fn join_render() {
        let j = JoinPlan {
            table: "organizations".into(),
            alias: Some("organization".into()),
            on: "organization.id = events.organization_id".into(),
        };
        assert_eq!(
            j.render(),
            "LEFT JOIN organizations AS organization ON organization.id = events.organization_id"
        );

        let j = JoinPlan {
            table: "events_tags".into(),
            alias: None,
            on: "events_tags.event_id = events.id".into(),
        };
        assert_eq!(
            j.render(),
            "LEFT JOIN events_tags ON events_tags.event_id = events.id"
        );
    }

    #[test]
    fn param_display() {
        assert_eq!(Param::Str("o'brien".into()).to_string(), "'o''brien'");
        assert_eq!(Param::Int(7).to_string(), "7");
        let ts = chrono::NaiveDate::from_ymd_opt(2025, 8, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(
            Param::TimestampTz(ts).to_string(),
            "'2025-08-07T00:00:00Z'"
        );
    }
}
