//! Full-text predicate compilation and term sanitization.
//!
//! Three strategies: ILIKE substring match, `to_tsvector` over the search
//! columns, and a precomputed tsvector column. A sanitized term that comes
//! out empty contributes no predicate at all.

use crate::fragment::{Binder, Fragment, Param};
use crate::options::{CompileOptions, SearchStrategy, TsQueryMode};

/// Longest full-text term the sanitizers let through, in bytes.
const MAX_TERM_BYTES: usize = 100;

/// Most whitespace-separated words the strict sanitizer looks at.
const MAX_RAW_WORDS: usize = 10;

/// Most prefix tokens the strict sanitizer emits.
const MAX_RAW_TOKENS: usize = 5;

/// Run the configured sanitizer, falling back to the default for the
/// tsquery mode.
pub fn sanitize(term: &str, opts: &CompileOptions) -> String {
    if let Some(custom) = &opts.full_text_sanitizer {
        return custom.sanitize(term);
    }
    match opts.tsquery_mode {
        TsQueryMode::Plainto => basic_sanitize(term),
        TsQueryMode::Raw => strict_sanitize(term),
    }
}

/// Trim, collapse whitespace runs, truncate. Used with `plainto_tsquery`
/// and ILIKE, which tolerate arbitrary text.
pub fn basic_sanitize(term: &str) -> String {
    let collapsed = term.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_bytes(&collapsed, MAX_TERM_BYTES).to_string()
}

/// Reduce the term to a conservative `to_tsquery` expression: a handful of
/// alphanumeric prefix tokens joined with `&`.
pub fn strict_sanitize(term: &str) -> String {
    truncate_bytes(term.trim(), MAX_TERM_BYTES)
        .split_whitespace()
        .take(MAX_RAW_WORDS)
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| word.chars().count() >= 2)
        .take(MAX_RAW_TOKENS)
        .map(|word| format!("{word}:*"))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Cut to at most `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Escape LIKE metacharacters in a literal.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            c => out.push(c),
        }
    }
    out
}

fn tsquery_fn(mode: TsQueryMode) -> &'static str {
    match mode {
        TsQueryMode::Plainto => "plainto_tsquery",
        TsQueryMode::Raw => "to_tsquery",
    }
}

/// Compile one sanitized term over the resolved search columns. Returns
/// `None` when no column applies.
pub fn compile_term(
    term: &str,
    columns: &[String],
    strategy: &SearchStrategy,
    mode: TsQueryMode,
    binder: &mut Binder,
) -> Option<Fragment> {
    match strategy {
        SearchStrategy::ILike => {
            let escaped = escape_like(term);
            let frags = columns
                .iter()
                .map(|col| {
                    let ph = binder.push(Param::Str(escaped.clone()));
                    Fragment::atom(format!("{col} ILIKE '%' || {ph} || '%'"))
                })
                .collect();
            Fragment::any(frags)
        }
        SearchStrategy::TsQuery { config } => {
            let func = tsquery_fn(mode);
            let frags = columns
                .iter()
                .map(|col| {
                    let ph = binder.push(Param::Str(term.to_string()));
                    Fragment::atom(format!(
                        "to_tsvector('{config}', coalesce({col}, '')) @@ {func}('{config}', {ph})"
                    ))
                })
                .collect();
            Fragment::any(frags)
        }
        SearchStrategy::Column { config, column } => {
            let func = tsquery_fn(mode);
            let ph = binder.push(Param::Str(term.to_string()));
            Some(Fragment::atom(format!(
                "{column} @@ {func}('{config}', {ph})"
            )))
        }
    }
}

/// Rank expression exported with the `Column` strategy.
pub fn rank_expression(config: &str, column: &str, mode: TsQueryMode, binder: &mut Binder, term: &str) -> String {
    let func = tsquery_fn(mode);
    let ph = binder.push(Param::Str(term.to_string()));
    format!("ts_rank_cd({column}, {func}('{config}', {ph}), 4)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_collapses_and_trims() {
        assert_eq!(basic_sanitize("  hello   world \n"), "hello world");
        assert_eq!(basic_sanitize(""), "");
    }

    #[test]
    fn basic_truncates_at_char_boundary() {
        let long = "é".repeat(80); // 160 bytes
        let out = basic_sanitize(&long);
        assert!(out.len() <= 100);
        assert_eq!(out, "é".repeat(50));
    }

    #[test]
    fn strict_builds_prefix_query() {
        assert_eq!(strict_sanitize("hello world"), "hello:* & world:*");
        // punctuation is stripped, short leftovers dropped
        assert_eq!(strict_sanitize("c++ is fun!"), "is:* & fun:*");
        // at most five tokens survive
        let out = strict_sanitize("one two three four five six seven");
        assert_eq!(out.matches(":*").count(), 5);
    }

    #[test]
    fn strict_can_come_out_empty() {
        assert_eq!(strict_sanitize("! @ # $"), "");
        assert_eq!(strict_sanitize("a b c"), "");
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
    }

    #[test]
    fn ilike_compiles_per_column() {
        let mut b = Binder::new();
        let frag = compile_term(
            "banjo",
            &["title".into(), "content".into()],
            &SearchStrategy::ILike,
            TsQueryMode::Plainto,
            &mut b,
        )
        .unwrap();
        assert_eq!(
            frag.sql(),
            "title ILIKE '%' || $1 || '%' OR content ILIKE '%' || $2 || '%'"
        );
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn tsquery_compiles_with_config() {
        let mut b = Binder::new();
        let frag = compile_term(
            "banjo",
            &["title".into()],
            &SearchStrategy::TsQuery {
                config: "english".into(),
            },
            TsQueryMode::Plainto,
            &mut b,
        )
        .unwrap();
        assert_eq!(
            frag.sql(),
            "to_tsvector('english', coalesce(title, '')) @@ plainto_tsquery('english', $1)"
        );
    }

    #[test]
    fn column_strategy_targets_the_column() {
        let mut b = Binder::new();
        let frag = compile_term(
            "banjo",
            &[],
            &SearchStrategy::Column {
                config: "english".into(),
                column: "searchable".into(),
            },
            TsQueryMode::Raw,
            &mut b,
        )
        .unwrap();
        assert_eq!(frag.sql(), "searchable @@ to_tsquery('english', $1)");
    }

    #[test]
    fn no_columns_means_no_predicate() {
        let mut b = Binder::new();
        assert!(
            compile_term("x", &[], &SearchStrategy::ILike, TsQueryMode::Plainto, &mut b).is_none()
        );
    }
}
