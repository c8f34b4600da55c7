//! Lowers the parsed AST into a parameterized relational query.
//!
//! Two passes over the tree:
//! 1. a planning pass resolves field paths far enough to pick the single
//!    association join and to decide whether an `ALL`-over-association
//!    aggregation is active
//! 2. a lowering pass emits condition fragments, binding parameters in
//!    source order
//!
//! Everything the handling knobs drop is dropped here; lex and parse
//! failures never reach this module.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::allow::AllowList;
use crate::ast::{Cmp, CmpOp, CmpValue, Node, Value};
use crate::cast::{self, CastError, Coerced};
use crate::fragment::{Binder, Fragment, JoinPlan, Param};
use crate::fulltext;
use crate::options::{CompileOptions, EmptyInPolicy, Handling, JoinOverflow, SearchStrategy};
use crate::schema::{Assoc, FieldType, SchemaView};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Unknown association '{0}'")]
    UnknownAssociation(String),

    #[error("Unknown schema '{0}'")]
    UnknownSchema(String),

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("NULL cannot be compared with an ordering operator (field '{0}')")]
    InvalidNullComparison(String),

    #[error("Query requires more than {max} association join(s)")]
    TooManyJoins { max: usize },

    #[error("Empty list for field '{0}'")]
    EmptyList(String),

    #[error("Full-text term given but no search fields are configured")]
    SearchNotConfigured,

    #[error("ALL over an association is only supported for one association, conjoined at the top level")]
    UnsupportedContainsAll,
}

/// A predicate dropped or rewritten under a lenient handling knob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    UnknownField(String),
    UnknownAssociation(String),
    InvalidValue { field: String, value: String },
    InvalidNullComparison(String),
    DegradedContainsAll(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownField(p) => write!(f, "unknown field '{p}', predicate dropped"),
            Warning::UnknownAssociation(a) => {
                write!(f, "unknown association '{a}', predicate dropped")
            }
            Warning::InvalidValue { field, value } => {
                write!(f, "invalid value '{value}' for field '{field}', predicate dropped")
            }
            Warning::InvalidNullComparison(field) => {
                write!(f, "NULL ordering comparison on '{field}', predicate dropped")
            }
            Warning::DegradedContainsAll(field) => {
                write!(f, "ALL on scalar field '{field}' degraded to IN")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

/// Planning metadata handed to the caller alongside the query.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Meta {
    pub uses_full_text: bool,
    pub added_select_fields: Vec<String>,
    pub recommended_order: Option<Vec<(String, Direction)>>,
    pub warnings: Vec<Warning>,
}

/// An extra select expression exported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectExtra {
    pub expr: String,
    pub alias: String,
}

/// The compiled query: WHERE fragment, join plan, aggregation plan, and
/// bind parameters. Produced in one pass; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    /// Physical table of the root schema.
    pub table: String,
    pub where_clause: Option<Fragment>,
    pub joins: Vec<JoinPlan>,
    pub group_by: Vec<String>,
    pub having: Option<Fragment>,
    pub distinct: bool,
    pub select_add: Vec<SelectExtra>,
    pub params: Vec<Param>,
    pub meta: Meta,
}

impl Compiled {
    /// False when every predicate was dropped (or the tree was empty); the
    /// caller should leave its base query untouched.
    pub fn has_predicates(&self) -> bool {
        self.where_clause.is_some() || self.having.is_some()
    }

    /// WHERE fragment text, if any.
    pub fn where_sql(&self) -> Option<&str> {
        self.where_clause.as_ref().map(Fragment::sql)
    }

    /// HAVING fragment text, if any.
    pub fn having_sql(&self) -> Option<&str> {
        self.having.as_ref().map(Fragment::sql)
    }

    /// Render the full SELECT statement with `$N` placeholders.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.table);
        sql.push_str(".*");
        for extra in &self.select_add {
            sql.push_str(", ");
            sql.push_str(&extra.expr);
            sql.push_str(" AS ");
            sql.push_str(&extra.alias);
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render());
        }
        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w.sql());
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some(h) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(h.sql());
        }
        sql
    }
}

type Result<T> = std::result::Result<T, BuildError>;

/// Lower an AST against a schema view. Empty trees (and trees whose every
/// predicate was dropped) compile to a [`Compiled`] without predicates.
pub fn compile_ast<S: SchemaView>(
    ast: &Node,
    view: &S,
    opts: &CompileOptions,
) -> Result<Compiled> {
    let mut builder = Builder::new(view, opts)?;
    builder.plan(ast)?;
    let where_clause = builder.lower(ast)?;
    Ok(builder.finish(where_clause))
}

// ============ Builder ============

struct Planned {
    assoc: String,
    many: bool,
    joins: Vec<JoinPlan>,
}

enum Resolved<'t> {
    Root {
        field: String,
        ty: &'t FieldType,
    },
    Assoc {
        name: String,
        field: String,
        ty: &'t FieldType,
        many: bool,
    },
}

impl Resolved<'_> {
    fn column(&self) -> String {
        match self {
            Resolved::Root { field, .. } => field.clone(),
            Resolved::Assoc { name, field, .. } => format!("{name}.{field}"),
        }
    }

    fn ty(&self) -> &FieldType {
        match self {
            Resolved::Root { ty, .. } | Resolved::Assoc { ty, .. } => ty,
        }
    }
}

struct Builder<'a, S: SchemaView> {
    view: &'a S,
    opts: &'a CompileOptions,
    allow: AllowList,
    root_table: String,
    root_pk: String,
    binder: Binder,
    warnings: Vec<Warning>,
    planned: Option<Planned>,
    aggregated: bool,
    having: Vec<Fragment>,
    group_by: Vec<String>,
    select_add: Vec<SelectExtra>,
    recommended_order: Option<Vec<(String, Direction)>>,
    uses_full_text: bool,
    saw_full_text: bool,
}

impl<'a, S: SchemaView> Builder<'a, S> {
    fn new(view: &'a S, opts: &'a CompileOptions) -> Result<Self> {
        let root_table = view
            .table(&opts.schema)
            .ok_or_else(|| BuildError::UnknownSchema(opts.schema.clone()))?
            .to_string();
        let root_pk = view
            .primary_key(&opts.schema)
            .unwrap_or("id")
            .to_string();
        let allow = match &opts.allowed_fields {
            None => AllowList::allow_all(),
            Some(entries) => AllowList::from_entries(entries),
        };
        Ok(Self {
            view,
            opts,
            allow,
            root_table,
            root_pk,
            binder: Binder::new(),
            warnings: Vec::new(),
            planned: None,
            aggregated: false,
            having: Vec::new(),
            group_by: Vec::new(),
            select_add: Vec::new(),
            recommended_order: None,
            uses_full_text: false,
            saw_full_text: false,
        })
    }

    fn finish(self, where_clause: Option<Fragment>) -> Compiled {
        let distinct = self
            .planned
            .as_ref()
            .is_some_and(|p| p.many && !self.aggregated);
        let added_select_fields = self
            .select_add
            .iter()
            .map(|extra| extra.alias.clone())
            .collect();
        Compiled {
            table: self.root_table,
            where_clause,
            joins: self.planned.map(|p| p.joins).unwrap_or_default(),
            group_by: self.group_by,
            having: Fragment::all(self.having),
            distinct,
            select_add: self.select_add,
            params: self.binder.into_params(),
            meta: Meta {
                uses_full_text: self.uses_full_text,
                added_select_fields,
                recommended_order: self.recommended_order,
                warnings: self.warnings,
            },
        }
    }

    // ============ Planning pass ============

    fn plan(&mut self, node: &Node) -> Result<()> {
        self.plan_node(node, true)?;
        if self.saw_full_text {
            let heads: Vec<String> = self
                .opts
                .search_fields
                .iter()
                .filter_map(|sf| sf.split_once('.').map(|(head, _)| head.to_string()))
                .collect();
            for head in heads {
                if self.view.association(&self.opts.schema, &head).is_some() {
                    self.claim_join(&head)?;
                }
            }
        }
        Ok(())
    }

    fn plan_node(&mut self, node: &Node, conjunctive: bool) -> Result<()> {
        match node {
            Node::And(children) => {
                for child in children {
                    self.plan_node(child, conjunctive)?;
                }
                Ok(())
            }
            Node::Or(children) => {
                for child in children {
                    self.plan_node(child, false)?;
                }
                Ok(())
            }
            Node::Not(inner) => self.plan_node(inner, false),
            Node::FullText { .. } => {
                self.saw_full_text = true;
                Ok(())
            }
            Node::Cmp(cmp) => {
                let Some((head, assoc)) = self.assoc_of(&cmp.path) else {
                    return Ok(());
                };
                let joined = self.claim_join(&head)?;
                if cmp.op == CmpOp::ContainsAll && assoc.is_many() {
                    if !joined {
                        // a second association: the HAVING plan cannot span it
                        return Err(BuildError::UnsupportedContainsAll);
                    }
                    if !conjunctive {
                        return Err(BuildError::UnsupportedContainsAll);
                    }
                    self.aggregated = true;
                }
                Ok(())
            }
        }
    }

    /// Association head of a path, if the path fully resolves to an
    /// association field. No policy side effects; the lowering pass reports.
    fn assoc_of(&self, raw: &[String]) -> Option<(String, Assoc)> {
        let path = self.allow.resolve(raw)?;
        if path.len() != 2 {
            return None;
        }
        let assoc = self.view.association(&self.opts.schema, &path[0])?;
        self.view.field_type(assoc.schema(), &path[1])?;
        Some((path[0].clone(), assoc.clone()))
    }

    /// Make `name` the planned join, or report overflow. Returns whether the
    /// association is (now) the planned one.
    fn claim_join(&mut self, name: &str) -> Result<bool> {
        if let Some(planned) = &self.planned {
            if planned.assoc == name {
                return Ok(true);
            }
            return match self.opts.join_overflow {
                JoinOverflow::Error => Err(BuildError::TooManyJoins {
                    max: self.opts.max_joins,
                }),
                JoinOverflow::Ignore => {
                    log::debug!("dropping predicates on association '{name}': join limit reached");
                    Ok(false)
                }
            };
        }
        if self.opts.max_joins == 0 {
            return match self.opts.join_overflow {
                JoinOverflow::Error => Err(BuildError::TooManyJoins { max: 0 }),
                JoinOverflow::Ignore => Ok(false),
            };
        }
        let assoc = self
            .view
            .association(&self.opts.schema, name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownAssociation(name.to_string()))?;
        let joins = self.join_plans(name, &assoc)?;
        self.planned = Some(Planned {
            assoc: name.to_string(),
            many: assoc.is_many(),
            joins,
        });
        Ok(true)
    }

    fn join_plans(&self, name: &str, assoc: &Assoc) -> Result<Vec<JoinPlan>> {
        let target_table = self
            .view
            .table(assoc.schema())
            .ok_or_else(|| BuildError::UnknownSchema(assoc.schema().to_string()))?
            .to_string();
        let root = &self.root_table;

        Ok(match assoc {
            Assoc::BelongsTo {
                owner_key,
                related_key,
                ..
            } => vec![JoinPlan {
                table: target_table,
                alias: Some(name.to_string()),
                on: format!("{root}.{owner_key} = {name}.{related_key}"),
            }],
            Assoc::HasOne {
                owner_key,
                related_key,
                ..
            }
            | Assoc::HasMany {
                owner_key,
                related_key,
                ..
            } => vec![JoinPlan {
                table: target_table,
                alias: Some(name.to_string()),
                on: format!("{name}.{related_key} = {root}.{owner_key}"),
            }],
            Assoc::ManyToMany {
                schema,
                join_table,
                owner_fk,
                related_fk,
            } => {
                let target_pk = self
                    .view
                    .primary_key(schema)
                    .ok_or_else(|| BuildError::UnknownSchema(schema.clone()))?;
                let root_pk = &self.root_pk;
                vec![
                    JoinPlan {
                        table: join_table.clone(),
                        alias: None,
                        on: format!("{join_table}.{owner_fk} = {root}.{root_pk}"),
                    },
                    JoinPlan {
                        table: target_table,
                        alias: Some(name.to_string()),
                        on: format!("{name}.{target_pk} = {join_table}.{related_fk}"),
                    },
                ]
            }
        })
    }

    // ============ Lowering pass ============

    fn lower(&mut self, node: &Node) -> Result<Option<Fragment>> {
        match node {
            Node::And(children) => {
                let mut frags = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(f) = self.lower(child)? {
                        frags.push(f);
                    }
                }
                Ok(Fragment::all(frags))
            }
            Node::Or(children) => {
                let mut frags = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(f) = self.lower(child)? {
                        frags.push(f);
                    }
                }
                Ok(Fragment::any(frags))
            }
            Node::Not(inner) => {
                // negating a bare search term has no WHERE effect
                if matches!(inner.as_ref(), Node::FullText { .. }) {
                    return Ok(None);
                }
                Ok(self.lower(inner)?.map(Fragment::negate))
            }
            Node::FullText { term } => self.lower_full_text(term),
            Node::Cmp(cmp) => self.lower_cmp(cmp),
        }
    }

    fn lower_cmp(&mut self, cmp: &Cmp) -> Result<Option<Fragment>> {
        let Some(target) = self.resolve(&cmp.path)? else {
            return Ok(None);
        };
        let col = target.column();
        match cmp.op {
            CmpOp::Eq | CmpOp::Neq | CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
                let ty = target.ty().clone();
                self.lower_scalar(cmp, &col, &ty)
            }
            CmpOp::StartsWith | CmpOp::EndsWith => Ok(self.lower_like(cmp, &col)),
            CmpOp::In | CmpOp::Nin => {
                let ty = target.ty().clone();
                self.lower_set(cmp, cmp.op, &col, &ty)
            }
            CmpOp::ContainsAll => self.lower_contains_all(cmp, target),
        }
    }

    fn lower_scalar(&mut self, cmp: &Cmp, col: &str, ty: &FieldType) -> Result<Option<Fragment>> {
        let CmpValue::One(value) = &cmp.value else {
            return self.invalid_value(&cmp.path_str(), &cmp.value_repr());
        };
        match cast::coerce(ty, cmp.op, value) {
            Ok(Coerced::Param(param)) => {
                let ph = self.binder.push(param);
                Ok(Some(Fragment::atom(format!(
                    "{col} {} {ph}",
                    sql_op(cmp.op)
                ))))
            }
            Ok(Coerced::Null) => Ok(Some(Fragment::atom(match cmp.op {
                CmpOp::Eq => format!("{col} IS NULL"),
                _ => format!("{col} IS NOT NULL"),
            }))),
            Ok(Coerced::DateOnly(date)) => self.lower_date_range(cmp, col, ty, date),
            Err(CastError::NullOrdering) => {
                let field = cmp.path_str();
                self.handle(
                    self.opts.invalid_cast,
                    Warning::InvalidNullComparison(field.clone()),
                    BuildError::InvalidNullComparison(field),
                )
            }
            Err(CastError::Invalid) => self.invalid_value(&cmp.path_str(), &cmp.value_repr()),
        }
    }

    /// Expand an ordered/equality comparison against a datetime column with
    /// a date-only literal into UTC day-boundary comparisons.
    fn lower_date_range(
        &mut self,
        cmp: &Cmp,
        col: &str,
        ty: &FieldType,
        date: chrono::NaiveDate,
    ) -> Result<Option<Fragment>> {
        let start = cast::day_start(date);
        let Some(next) = cast::day_next(date) else {
            return self.invalid_value(&cmp.path_str(), &cmp.value_repr());
        };
        let frag = match cmp.op {
            CmpOp::Eq | CmpOp::Neq => {
                let start_ph = self.binder.push(boundary_param(ty, start));
                let next_ph = self.binder.push(boundary_param(ty, next));
                let range =
                    Fragment::composite(format!("{col} >= {start_ph} AND {col} < {next_ph}"));
                if cmp.op == CmpOp::Neq {
                    range.negate()
                } else {
                    range
                }
            }
            CmpOp::Gte => {
                let ph = self.binder.push(boundary_param(ty, start));
                Fragment::atom(format!("{col} >= {ph}"))
            }
            CmpOp::Gt => {
                let ph = self.binder.push(boundary_param(ty, next));
                Fragment::atom(format!("{col} >= {ph}"))
            }
            CmpOp::Lte => {
                let ph = self.binder.push(boundary_param(ty, next));
                Fragment::atom(format!("{col} < {ph}"))
            }
            CmpOp::Lt => {
                let ph = self.binder.push(boundary_param(ty, start));
                Fragment::atom(format!("{col} < {ph}"))
            }
            _ => return self.invalid_value(&cmp.path_str(), &cmp.value_repr()),
        };
        Ok(Some(frag))
    }

    fn lower_like(&mut self, cmp: &Cmp, col: &str) -> Option<Fragment> {
        let CmpValue::One(Value::Str(base)) = &cmp.value else {
            return None;
        };
        let escaped = fulltext::escape_like(base);
        let pattern = match cmp.op {
            CmpOp::StartsWith => format!("{escaped}%"),
            _ => format!("%{escaped}"),
        };
        let ph = self.binder.push(Param::Str(pattern));
        Some(Fragment::atom(format!("{col} ILIKE {ph}")))
    }

    /// NULL-aware `IN` / `NOT IN`.
    fn lower_set(
        &mut self,
        cmp: &Cmp,
        op: CmpOp,
        col: &str,
        ty: &FieldType,
    ) -> Result<Option<Fragment>> {
        let CmpValue::Many(items) = &cmp.value else {
            return self.invalid_value(&cmp.path_str(), &cmp.value_repr());
        };
        if items.is_empty() {
            return match self.opts.empty_in {
                EmptyInPolicy::Error => Err(BuildError::EmptyList(cmp.path_str())),
                EmptyInPolicy::MatchNone => Ok(Some(Fragment::atom(if op == CmpOp::In {
                    "FALSE"
                } else {
                    "TRUE"
                }))),
                EmptyInPolicy::MatchAll => Ok(Some(Fragment::atom(if op == CmpOp::In {
                    "TRUE"
                } else {
                    "FALSE"
                }))),
            };
        }

        let mut params = Vec::new();
        let mut has_null = false;
        for item in items {
            match item {
                Value::Null => has_null = true,
                Value::Str(_) => match cast::coerce(ty, op, item) {
                    Ok(Coerced::Param(p)) => params.push(p),
                    _ => return self.invalid_value(&cmp.path_str(), &cmp.value_repr()),
                },
            }
        }

        let frag = match (op, params.is_empty(), has_null) {
            (CmpOp::In, true, _) => Fragment::atom(format!("{col} IS NULL")),
            (CmpOp::In, false, false) => {
                let phs = self.binder.push_list(params);
                Fragment::atom(format!("{col} IN ({phs})"))
            }
            (CmpOp::In, false, true) => {
                let phs = self.binder.push_list(params);
                Fragment::composite(format!("({col} IN ({phs})) OR {col} IS NULL"))
            }
            (_, true, _) => Fragment::atom(format!("{col} IS NOT NULL")),
            (_, false, false) => {
                let phs = self.binder.push_list(params);
                Fragment::atom(format!("{col} NOT IN ({phs})"))
            }
            (_, false, true) => {
                let phs = self.binder.push_list(params);
                Fragment::composite(format!("({col} NOT IN ({phs})) AND {col} IS NOT NULL"))
            }
        };
        Ok(Some(frag))
    }

    fn lower_contains_all(
        &mut self,
        cmp: &Cmp,
        target: Resolved<'_>,
    ) -> Result<Option<Fragment>> {
        let col = target.column();
        match &target {
            Resolved::Root { ty, .. } => {
                if let FieldType::Array(inner) = ty {
                    self.lower_array_contains(cmp, &col, inner)
                } else {
                    // scalar column: every listed value cannot match at once
                    let field = cmp.path_str();
                    log::warn!("{}", Warning::DegradedContainsAll(field.clone()));
                    self.warnings.push(Warning::DegradedContainsAll(field));
                    let ty = (*ty).clone();
                    self.lower_set(cmp, CmpOp::In, &col, &ty)
                }
            }
            Resolved::Assoc {
                many: false, ty, ..
            } => {
                let field = cmp.path_str();
                log::warn!("{}", Warning::DegradedContainsAll(field.clone()));
                self.warnings.push(Warning::DegradedContainsAll(field));
                let ty = (*ty).clone();
                self.lower_set(cmp, CmpOp::In, &col, &ty)
            }
            Resolved::Assoc { many: true, ty, .. } => {
                let ty = (*ty).clone();
                self.lower_assoc_contains(cmp, &col, &ty)
            }
        }
    }

    fn lower_array_contains(
        &mut self,
        cmp: &Cmp,
        col: &str,
        inner: &FieldType,
    ) -> Result<Option<Fragment>> {
        let CmpValue::Many(items) = &cmp.value else {
            return self.invalid_value(&cmp.path_str(), &cmp.value_repr());
        };
        let mut params = Vec::new();
        for item in items {
            match cast::coerce(inner, cmp.op, item) {
                Ok(Coerced::Param(p)) => params.push(p),
                _ => return self.invalid_value(&cmp.path_str(), &cmp.value_repr()),
            }
        }
        let phs = self.binder.push_list(params);
        Ok(Some(Fragment::atom(format!(
            "{col} @> ARRAY[{phs}]::{}[]",
            inner.pg_name()
        ))))
    }

    /// `ALL` over a has-many / many-to-many association: the joined rows
    /// matching the requested values must cover all of them, expressed as
    /// `GROUP BY root_pk HAVING count(distinct col) = N`.
    fn lower_assoc_contains(
        &mut self,
        cmp: &Cmp,
        col: &str,
        ty: &FieldType,
    ) -> Result<Option<Fragment>> {
        let CmpValue::Many(items) = &cmp.value else {
            return self.invalid_value(&cmp.path_str(), &cmp.value_repr());
        };
        let mut params: Vec<Param> = Vec::new();
        for item in items {
            match cast::coerce(ty, cmp.op, item) {
                Ok(Coerced::Param(p)) => {
                    if !params.contains(&p) {
                        params.push(p);
                    }
                }
                _ => return self.invalid_value(&cmp.path_str(), &cmp.value_repr()),
            }
        }
        let count = params.len() as i64;
        let phs = self.binder.push_list(params);
        let frag = Fragment::atom(format!("{col} IN ({phs})"));

        let count_ph = self.binder.push(Param::Int(count));
        self.having
            .push(Fragment::atom(format!("count(DISTINCT {col}) = {count_ph}")));
        if self.group_by.is_empty() {
            self.group_by
                .push(format!("{}.{}", self.root_table, self.root_pk));
        }
        Ok(Some(frag))
    }

    // ============ Full-text ============

    fn lower_full_text(&mut self, term: &str) -> Result<Option<Fragment>> {
        let clean = fulltext::sanitize(term, self.opts);
        if clean.is_empty() {
            log::debug!("full-text term sanitized to empty, dropped");
            return Ok(None);
        }
        let strategy = self.opts.search_strategy.clone();

        if let SearchStrategy::Column { config, column } = &strategy {
            let frag = fulltext::compile_term(
                &clean,
                &[],
                &strategy,
                self.opts.tsquery_mode,
                &mut self.binder,
            );
            if self.select_add.is_empty() {
                let expr = fulltext::rank_expression(
                    config,
                    column,
                    self.opts.tsquery_mode,
                    &mut self.binder,
                    &clean,
                );
                self.select_add.push(SelectExtra {
                    expr,
                    alias: "search_rank".to_string(),
                });
                self.recommended_order =
                    Some(vec![("search_rank".to_string(), Direction::Desc)]);
            }
            self.uses_full_text = true;
            return Ok(frag);
        }

        if self.opts.search_fields.is_empty() {
            return Err(BuildError::SearchNotConfigured);
        }
        let columns = self.search_columns();
        if columns.is_empty() {
            log::debug!("no applicable search fields for full-text term, dropped");
            return Ok(None);
        }
        let frag = fulltext::compile_term(
            &clean,
            &columns,
            &strategy,
            self.opts.tsquery_mode,
            &mut self.binder,
        );
        if frag.is_some() {
            self.uses_full_text = true;
        }
        Ok(frag)
    }

    /// Search fields that exist on the root schema or on the joined
    /// association; the rest are skipped.
    fn search_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for field in &self.opts.search_fields {
            if let Some((head, leaf)) = field.split_once('.') {
                let Some(planned) = &self.planned else {
                    continue;
                };
                if planned.assoc != head {
                    continue;
                }
                let Some(assoc) = self.view.association(&self.opts.schema, head) else {
                    continue;
                };
                if self.view.field_type(assoc.schema(), leaf).is_some() {
                    columns.push(format!("{head}.{leaf}"));
                }
            } else if self.view.field_type(&self.opts.schema, field).is_some() {
                columns.push(field.clone());
            }
        }
        columns
    }

    // ============ Resolution & policy dispatch ============

    fn resolve(&mut self, raw: &[String]) -> Result<Option<Resolved<'a>>> {
        let view = self.view;
        let Some(path) = self.allow.resolve(raw) else {
            return self.unknown_field(raw.join("."));
        };
        match path.len() {
            1 => match view.field_type(&self.opts.schema, &path[0]) {
                Some(ty) => Ok(Some(Resolved::Root {
                    field: path[0].clone(),
                    ty,
                })),
                None => self.unknown_field(path.join(".")),
            },
            2 => {
                let Some(assoc) = view.association(&self.opts.schema, &path[0]) else {
                    return self.unknown_assoc(path[0].clone());
                };
                match view.field_type(assoc.schema(), &path[1]) {
                    Some(ty) => {
                        if self
                            .planned
                            .as_ref()
                            .is_none_or(|planned| planned.assoc != path[0])
                        {
                            // overflowed association (join limit reached)
                            return Ok(None);
                        }
                        Ok(Some(Resolved::Assoc {
                            name: path[0].clone(),
                            field: path[1].clone(),
                            ty,
                            many: assoc.is_many(),
                        }))
                    }
                    None => self.unknown_field(path.join(".")),
                }
            }
            // deeper traversals are outside the grammar's one-hop limit
            _ => self.unknown_field(path.join(".")),
        }
    }

    fn handle<T>(
        &mut self,
        handling: Handling,
        warning: Warning,
        error: BuildError,
    ) -> Result<Option<T>> {
        match handling {
            Handling::Ignore => {
                log::debug!("{warning}");
                Ok(None)
            }
            Handling::Warn => {
                log::warn!("{warning}");
                self.warnings.push(warning);
                Ok(None)
            }
            Handling::Error => Err(error),
        }
    }

    fn unknown_field<T>(&mut self, path: String) -> Result<Option<T>> {
        self.handle(
            self.opts.unknown_field,
            Warning::UnknownField(path.clone()),
            BuildError::UnknownField(path),
        )
    }

    fn unknown_assoc<T>(&mut self, name: String) -> Result<Option<T>> {
        self.handle(
            self.opts.unknown_assoc,
            Warning::UnknownAssociation(name.clone()),
            BuildError::UnknownAssociation(name),
        )
    }

    fn invalid_value<T>(&mut self, field: &str, value: &str) -> Result<Option<T>> {
        self.handle(
            self.opts.invalid_cast,
            Warning::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            },
            BuildError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            },
        )
    }
}

fn boundary_param(ty: &FieldType, boundary: chrono::NaiveDateTime) -> Param {
    match ty {
        FieldType::UtcDatetime | FieldType::UtcDatetimeUsec => {
            Param::TimestampTz(boundary.and_utc())
        }
        _ => Param::Timestamp(boundary),
    }
}

fn sql_op(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "=",
        CmpOp::Neq => "<>",
        CmpOp::Gt => ">",
        CmpOp::Gte => ">=",
        CmpOp::Lt => "<",
        CmpOp::Lte => "<=",
        // set and pattern operators have their own lowering
        _ => "=",
    }
}

impl Cmp {
    /// Human-readable rendition of the value for diagnostics.
    fn value_repr(&self) -> String {
        fn scalar(v: &Value) -> String {
            match v {
                Value::Null => "NULL".to_string(),
                Value::Str(s) => s.clone(),
            }
        }
        match &self.value {
            CmpValue::One(v) => scalar(v),
            CmpValue::Many(vs) => vs.iter().map(scalar).collect::<Vec<_>>().join(", "),
        }
    }
}

// ============ Sanity tests ============
// Black-box coverage lives in tests/integration.rs.
