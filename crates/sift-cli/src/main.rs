//! sift-cli: inspect query compilation stage by stage
//!
//! `sift tokens` prints the token stream, `sift ast` the parsed tree, and
//! `sift sql` the generated SQL against a schema config file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use sift::{
    AllowEntry, CompileOptions, Mode, SchemaCatalog, SearchStrategy, SiftError, TsQueryMode,
};

// ============ CLI ============

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Compile search queries to parameterized SQL")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream for a query
    Tokens {
        query: String,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the parsed AST for a query
    Ast {
        query: String,
        /// Emit JSON instead of the debug tree
        #[arg(long)]
        json: bool,
        /// Print the canonical query text instead
        #[arg(long)]
        canonical: bool,
    },
    /// Compile a query against a schema config and print SQL + params
    Sql {
        query: String,
        /// Path to a JSON schema config (see `--help` for the shape)
        #[arg(short, long)]
        config: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

// ============ Schema config ============

/// JSON shape:
/// ```json
/// {
///   "root": "events",
///   "schemas": { "events": { "table": "events", "fields": { "status": "text" } } },
///   "allowed_fields": ["status", { "alias": "org.name", "field": "organization.name" }],
///   "search_fields": ["title"],
///   "search_strategy": { "ts_query": { "config": "english" } },
///   "mode": "strict"
/// }
/// ```
#[derive(Deserialize)]
struct Config {
    root: String,
    schemas: SchemaCatalog,
    #[serde(default)]
    allowed_fields: Option<Vec<AllowEntry>>,
    #[serde(default)]
    search_fields: Vec<String>,
    #[serde(default)]
    search_strategy: Option<SearchStrategy>,
    #[serde(default)]
    tsquery_mode: Option<TsQueryMode>,
    #[serde(default)]
    mode: Option<Mode>,
}

impl Config {
    fn options(&self) -> CompileOptions {
        let mut opts = CompileOptions::with_mode(&self.root, self.mode.unwrap_or_default())
            .with_search_fields(self.search_fields.clone());
        if let Some(allowed) = &self.allowed_fields {
            opts = opts.with_allowed_fields(allowed.clone());
        }
        if let Some(strategy) = &self.search_strategy {
            opts = opts.with_search_strategy(strategy.clone());
        }
        if let Some(mode) = self.tsquery_mode {
            opts = opts.with_tsquery_mode(mode);
        }
        opts
    }
}

// ============ Commands ============

fn tokens(query: &str, json: bool) -> Result<(), SiftError> {
    let tokens = sift::scan(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tokens).expect("tokens serialize"));
        return Ok(());
    }
    for token in &tokens {
        let literal = token.literal.as_deref().unwrap_or("-");
        println!(
            "{:>4}..{:<4} {:<18} {:<16} {}",
            token.span.offset,
            token.span.end(),
            format!("{:?}", token.kind),
            token.lexeme,
            literal
        );
    }
    Ok(())
}

fn ast(query: &str, json: bool, canonical: bool) -> Result<(), SiftError> {
    let node = sift::parse(&sift::scan(query)?)?;
    if canonical {
        println!("{node}");
    } else if json {
        println!("{}", serde_json::to_string_pretty(&node).expect("ast serialize"));
    } else {
        println!("{node:#?}");
    }
    Ok(())
}

fn sql(query: &str, config_path: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(config_path)?;
    let config: Config = serde_json::from_str(&raw)?;
    let opts = config.options();

    let compiled = sift::compile(query, &config.schemas, &opts)?;
    for warning in &compiled.meta.warnings {
        log::warn!("{warning}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&compiled).expect("compiled serialize"));
        return Ok(());
    }

    if !compiled.has_predicates() {
        println!("-- no predicates");
    }
    println!("{}", compiled.to_sql());
    for (i, param) in compiled.params.iter().enumerate() {
        println!("  ${} = {}", i + 1, param);
    }
    if compiled.meta.uses_full_text {
        println!("-- uses full-text search");
    }
    if let Some(order) = &compiled.meta.recommended_order {
        println!("-- recommended order: {order:?}");
    }
    Ok(())
}

// ============ Main ============

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let result: Result<(), Box<dyn std::error::Error>> = match &args.command {
        Command::Tokens { query, json } => tokens(query, *json).map_err(Into::into),
        Command::Ast {
            query,
            json,
            canonical,
        } => ast(query, *json, *canonical).map_err(Into::into),
        Command::Sql {
            query,
            config,
            json,
        } => sql(query, config, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
