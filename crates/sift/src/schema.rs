//! Schema metadata the builder resolves fields and associations against.
//!
//! The compiler never introspects a live database: callers describe their
//! schemas through the [`SchemaView`] trait. [`SchemaCatalog`] is the
//! in-memory implementation used by tests and the CLI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column type as declared by the schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Bool,
    Date,
    UtcDatetime,
    UtcDatetimeUsec,
    NaiveDatetime,
    NaiveDatetimeUsec,
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            FieldType::UtcDatetime
                | FieldType::UtcDatetimeUsec
                | FieldType::NaiveDatetime
                | FieldType::NaiveDatetimeUsec
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }

    /// PostgreSQL type name, used for array literals casts.
    pub fn pg_name(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Text => "text",
            FieldType::Integer => "bigint",
            FieldType::Float => "double precision",
            FieldType::Decimal => "numeric",
            FieldType::Bool => "boolean",
            FieldType::Date => "date",
            FieldType::UtcDatetime | FieldType::UtcDatetimeUsec => "timestamptz",
            FieldType::NaiveDatetime | FieldType::NaiveDatetimeUsec => "timestamp",
            FieldType::Array(inner) => inner.pg_name(),
        }
    }
}

/// An association to another schema, with the key metadata needed to
/// generate the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Assoc {
    BelongsTo {
        schema: String,
        /// Foreign key column on the owning (root) table.
        owner_key: String,
        /// Referenced column on the associated table.
        related_key: String,
    },
    HasOne {
        schema: String,
        /// Referenced column on the root table.
        owner_key: String,
        /// Foreign key column on the associated table.
        related_key: String,
    },
    HasMany {
        schema: String,
        owner_key: String,
        related_key: String,
    },
    ManyToMany {
        schema: String,
        join_table: String,
        /// Column on the join table pointing at the root primary key.
        owner_fk: String,
        /// Column on the join table pointing at the associated primary key.
        related_fk: String,
    },
}

impl Assoc {
    /// Name of the associated schema.
    pub fn schema(&self) -> &str {
        match self {
            Assoc::BelongsTo { schema, .. }
            | Assoc::HasOne { schema, .. }
            | Assoc::HasMany { schema, .. }
            | Assoc::ManyToMany { schema, .. } => schema,
        }
    }

    /// True when a joined row can multiply root rows.
    pub fn is_many(&self) -> bool {
        matches!(self, Assoc::HasMany { .. } | Assoc::ManyToMany { .. })
    }
}

/// Read-only schema description consumed by the builder.
pub trait SchemaView {
    /// Physical table name for a schema.
    fn table(&self, schema: &str) -> Option<&str>;

    /// Declared field names, in declaration order.
    fn field_names(&self, schema: &str) -> Vec<&str>;

    fn field_type(&self, schema: &str, field: &str) -> Option<&FieldType>;

    fn primary_key(&self, schema: &str) -> Option<&str>;

    fn association(&self, schema: &str, name: &str) -> Option<&Assoc>;
}

// ============ In-memory catalog ============

/// Schema description for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldType>,
    #[serde(default)]
    pub associations: IndexMap<String, Assoc>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl SchemaDef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: default_primary_key(),
            fields: IndexMap::new(),
            associations: IndexMap::new(),
        }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        schema: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        self.associations.insert(
            name.into(),
            Assoc::BelongsTo {
                schema: schema.into(),
                owner_key: owner_key.into(),
                related_key: related_key.into(),
            },
        );
        self
    }

    pub fn has_one(
        mut self,
        name: impl Into<String>,
        schema: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        self.associations.insert(
            name.into(),
            Assoc::HasOne {
                schema: schema.into(),
                owner_key: owner_key.into(),
                related_key: related_key.into(),
            },
        );
        self
    }

    pub fn has_many(
        mut self,
        name: impl Into<String>,
        schema: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        self.associations.insert(
            name.into(),
            Assoc::HasMany {
                schema: schema.into(),
                owner_key: owner_key.into(),
                related_key: related_key.into(),
            },
        );
        self
    }

    pub fn many_to_many(
        mut self,
        name: impl Into<String>,
        schema: impl Into<String>,
        join_table: impl Into<String>,
        owner_fk: impl Into<String>,
        related_fk: impl Into<String>,
    ) -> Self {
        self.associations.insert(
            name.into(),
            Assoc::ManyToMany {
                schema: schema.into(),
                join_table: join_table.into(),
                owner_fk: owner_fk.into(),
                related_fk: related_fk.into(),
            },
        );
        self
    }
}

/// A set of named schemas. Implements [`SchemaView`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    schemas: IndexMap<String, SchemaDef>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: impl Into<String>, def: SchemaDef) -> Self {
        self.schemas.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.get(name)
    }
}

impl SchemaView for SchemaCatalog {
    fn table(&self, schema: &str) -> Option<&str> {
        self.schemas.get(schema).map(|s| s.table.as_str())
    }

    fn field_names(&self, schema: &str) -> Vec<&str> {
        self.schemas
            .get(schema)
            .map(|s| s.fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn field_type(&self, schema: &str, field: &str) -> Option<&FieldType> {
        self.schemas.get(schema)?.fields.get(field)
    }

    fn primary_key(&self, schema: &str) -> Option<&str> {
        self.schemas.get(schema).map(|s| s.primary_key.as_str())
    }

    fn association(&self, schema: &str, name: &str) -> Option<&Assoc> {
        self.schemas.get(schema)?.associations.get(name)
    }
}
