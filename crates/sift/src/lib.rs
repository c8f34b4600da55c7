//! sift — a search-query compiler
//!
//! Compiles compact, human-authored filter expressions into parameterized
//! PostgreSQL WHERE clauses plus join and planning metadata:
//!
//! ```text
//! status:live AND org.name:Bea* banjo
//! ```
//!
//! The pipeline has three stages, each usable on its own:
//! - [`scan`]: bytes → tokens with spans, implicit `AND` insertion
//! - [`parse`]: tokens → flattened boolean AST
//! - [`compile_ast`]: AST → [`Compiled`] (WHERE fragment, joins, group-by
//!   plan, bind parameters, meta)
//!
//! ## Quick start
//!
//! ```
//! use sift::{compile, CompileOptions, FieldType, SchemaCatalog, SchemaDef};
//!
//! let catalog = SchemaCatalog::new().with_schema(
//!     "events",
//!     SchemaDef::new("events")
//!         .field("status", FieldType::Text)
//!         .field("priority", FieldType::Integer),
//! );
//!
//! let opts = CompileOptions::new("events");
//! let compiled = compile("status:live AND priority>3", &catalog, &opts)?;
//! assert_eq!(compiled.where_sql(), Some("status = $1 AND priority > $2"));
//! # Ok::<(), sift::SiftError>(())
//! ```
//!
//! Compilation is pure and synchronous: same inputs, same output, no I/O.

mod allow;
mod ast;
mod build;
mod cast;
mod fragment;
mod fulltext;
mod options;
mod parse;
mod pretty;
mod scan;
mod schema;
mod token;

use thiserror::Error;

// ============ Primary public API ============

pub use allow::{AllowEntry, AllowList};
pub use ast::{Cmp, CmpOp, CmpValue, Node, Value};
pub use build::{
    compile_ast, BuildError, Compiled, Direction, Meta, SelectExtra, Warning,
};
pub use fragment::{Binder, Fragment, JoinPlan, Param};
pub use fulltext::{basic_sanitize, escape_like, strict_sanitize};
pub use options::{
    CompileOptions, EmptyInPolicy, Handling, JoinOverflow, Mode, Sanitizer, SearchStrategy,
    TsQueryMode,
};
pub use parse::{parse, ParseError};
pub use scan::{scan, to_snake, LexError};
pub use schema::{Assoc, FieldType, SchemaCatalog, SchemaDef, SchemaView};
pub use token::{Span, Token, TokenKind};

// ============ Errors ============

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Build,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiftError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Build(#[from] BuildError),
}

impl SiftError {
    pub fn stage(&self) -> Stage {
        match self {
            SiftError::Lex(_) => Stage::Lex,
            SiftError::Parse(_) => Stage::Parse,
            SiftError::Build(_) => Stage::Build,
        }
    }

    /// Byte offset of the error. Build errors have no source position.
    pub fn position(&self) -> Option<usize> {
        match self {
            SiftError::Lex(e) => Some(e.position()),
            SiftError::Parse(e) => Some(e.position()),
            SiftError::Build(_) => None,
        }
    }
}

// ============ Facade ============

/// Run the full pipeline: scan, parse, lower.
pub fn compile<S: SchemaView>(
    source: &str,
    view: &S,
    opts: &CompileOptions,
) -> Result<Compiled, SiftError> {
    log::debug!("compiling query ({} bytes)", source.len());
    let tokens = scan(source)?;
    let node = parse(&tokens)?;
    let compiled = compile_ast(&node, view, opts)?;
    Ok(compiled)
}

/// Compile and render the full SELECT statement.
pub fn to_sql<S: SchemaView>(
    source: &str,
    view: &S,
    opts: &CompileOptions,
) -> Result<(String, Vec<Param>, Meta), SiftError> {
    let compiled = compile(source, view, opts)?;
    let sql = compiled.to_sql();
    Ok((sql, compiled.params, compiled.meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new().with_schema(
            "events",
            SchemaDef::new("events").field("status", FieldType::Text),
        )
    }

    #[test]
    fn error_stages() {
        let opts = CompileOptions::strict("events");
        let catalog = catalog();

        let err = compile("status:'oops", &catalog, &opts).unwrap_err();
        assert_eq!(err.stage(), Stage::Lex);
        assert_eq!(err.position(), Some(7));

        let err = compile("status:live AND", &catalog, &opts).unwrap_err();
        assert_eq!(err.stage(), Stage::Parse);
        assert_eq!(err.position(), Some(12));

        let err = compile("missing:live", &catalog, &opts).unwrap_err();
        assert_eq!(err.stage(), Stage::Build);
        assert_eq!(err.position(), None);
    }

    #[test]
    fn facade_to_sql() {
        let opts = CompileOptions::new("events");
        let (sql, params, meta) = to_sql("status:live", &catalog(), &opts).unwrap();
        assert_eq!(sql, "SELECT events.* FROM events WHERE status = $1");
        assert_eq!(params, vec![Param::Str("live".into())]);
        assert!(!meta.uses_full_text);
    }
}
