//! Compilation options.
//!
//! Every knob is a typed enum. `Mode` presets the three handling knobs;
//! individual `with_*` calls override the preset.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::allow::AllowEntry;

/// Preset for the handling knobs: `Lenient` warns and drops, `Strict`
/// surfaces errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Lenient,
    Strict,
}

/// What to do with a predicate the schema or allow-list rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handling {
    /// Drop the predicate silently.
    Ignore,
    /// Drop the predicate and record a warning in the meta.
    Warn,
    /// Fail the compile.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOverflow {
    /// Drop predicates that would need a further join.
    Ignore,
    Error,
}

/// Policy for empty `IN`/`NOT IN` lists reaching the builder. The parser
/// rejects literal empty lists; this applies to programmatic ASTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInPolicy {
    /// An empty `IN` matches nothing (and an empty `NOT IN` everything).
    MatchNone,
    /// An empty `IN` matches everything.
    MatchAll,
    Error,
}

/// Which tsquery constructor (and default sanitizer) to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TsQueryMode {
    #[default]
    Plainto,
    Raw,
}

/// Full-text search plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Case-insensitive substring match over each search field.
    #[default]
    ILike,
    /// `to_tsvector(config, col) @@ ..._tsquery(config, term)` per field.
    TsQuery { config: String },
    /// Match against a precomputed tsvector column; also exports a
    /// `search_rank` select expression and a recommended ordering.
    Column { config: String, column: String },
}

/// Plug-in point for full-text term sanitization. Blanket-implemented for
/// closures and function references.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, term: &str) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sanitize(&self, term: &str) -> String {
        self(term)
    }
}

/// All compilation knobs. Build one with [`CompileOptions::new`] and the
/// `with_*` methods.
#[derive(Clone)]
pub struct CompileOptions {
    /// Root schema queries resolve against.
    pub schema: String,
    /// `None` admits every parseable path (allow-all).
    pub allowed_fields: Option<Vec<AllowEntry>>,
    pub mode: Mode,
    pub unknown_field: Handling,
    pub unknown_assoc: Handling,
    pub invalid_cast: Handling,
    /// Upper bound on association joins. One is the deepest traversal the
    /// grammar supports.
    pub max_joins: usize,
    pub join_overflow: JoinOverflow,
    pub empty_in: EmptyInPolicy,
    pub tsquery_mode: TsQueryMode,
    pub search_fields: Vec<String>,
    pub search_strategy: SearchStrategy,
    pub full_text_sanitizer: Option<Arc<dyn Sanitizer>>,
}

impl CompileOptions {
    /// Lenient options for a root schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self::with_mode(schema, Mode::Lenient)
    }

    /// Strict options for a root schema.
    pub fn strict(schema: impl Into<String>) -> Self {
        Self::with_mode(schema, Mode::Strict)
    }

    pub fn with_mode(schema: impl Into<String>, mode: Mode) -> Self {
        let handling = match mode {
            Mode::Lenient => Handling::Warn,
            Mode::Strict => Handling::Error,
        };
        Self {
            schema: schema.into(),
            allowed_fields: None,
            mode,
            unknown_field: handling,
            unknown_assoc: handling,
            invalid_cast: handling,
            max_joins: 1,
            join_overflow: JoinOverflow::Ignore,
            empty_in: EmptyInPolicy::MatchNone,
            tsquery_mode: TsQueryMode::default(),
            search_fields: Vec::new(),
            search_strategy: SearchStrategy::default(),
            full_text_sanitizer: None,
        }
    }

    pub fn with_allowed_fields(mut self, entries: Vec<AllowEntry>) -> Self {
        self.allowed_fields = Some(entries);
        self
    }

    pub fn with_unknown_field(mut self, handling: Handling) -> Self {
        self.unknown_field = handling;
        self
    }

    pub fn with_unknown_assoc(mut self, handling: Handling) -> Self {
        self.unknown_assoc = handling;
        self
    }

    pub fn with_invalid_cast(mut self, handling: Handling) -> Self {
        self.invalid_cast = handling;
        self
    }

    pub fn with_join_overflow(mut self, policy: JoinOverflow) -> Self {
        self.join_overflow = policy;
        self
    }

    pub fn with_empty_in(mut self, policy: EmptyInPolicy) -> Self {
        self.empty_in = policy;
        self
    }

    pub fn with_tsquery_mode(mut self, mode: TsQueryMode) -> Self {
        self.tsquery_mode = mode;
        self
    }

    pub fn with_search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn with_search_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search_strategy = strategy;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.full_text_sanitizer = Some(sanitizer);
        self
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("schema", &self.schema)
            .field("allowed_fields", &self.allowed_fields)
            .field("mode", &self.mode)
            .field("unknown_field", &self.unknown_field)
            .field("unknown_assoc", &self.unknown_assoc)
            .field("invalid_cast", &self.invalid_cast)
            .field("max_joins", &self.max_joins)
            .field("join_overflow", &self.join_overflow)
            .field("empty_in", &self.empty_in)
            .field("tsquery_mode", &self.tsquery_mode)
            .field("search_fields", &self.search_fields)
            .field("search_strategy", &self.search_strategy)
            .field(
                "full_text_sanitizer",
                &self.full_text_sanitizer.as_ref().map(|_| "<custom>"),
            )
            .finish()
    }
}
