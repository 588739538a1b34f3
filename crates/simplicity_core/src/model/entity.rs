//! Entity contract: the only coupling point between user types and the
//! persistence core.
//!
//! # Responsibility
//! - Let a type declare its persistable fields, identity and semantic types.
//! - Convert instances to and from a field-name keyed [`Record`].
//!
//! # Invariants
//! - `Entity::definition()` must be deterministic; the registry derives the
//!   schema from it once and never asks again.
//! - `from_record(&to_record(e))` must rebuild `e`.

use crate::mapper::MapResult;
use crate::model::record::Record;
use crate::model::value::SqlType;
use crate::naming::{capitalize, convert_to_camel_case, short_type_name};
use serde::{Deserialize, Serialize};

/// A type whose instances persist as rows of one table.
pub trait Entity: Sized + 'static {
    /// Declared persistence metadata for this type.
    fn definition() -> EntityDefinition;

    /// Field values of this instance, keyed by field name.
    fn to_record(&self) -> Record;

    /// Rebuilds an instance from decoded field values.
    fn from_record(record: &Record) -> MapResult<Self>;
}

/// How an identity value comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Store-generated integer key, read back after insert.
    Generated,
    /// Caller-supplied key, written with the row.
    Assigned,
}

/// Declared metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    /// Explicit column name; defaults to the snake_case field name.
    pub column: Option<String>,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub identity: bool,
    /// Excluded from persistence entirely.
    pub transient: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            column: None,
            sql_type,
            nullable: false,
            identity: false,
            transient: false,
        }
    }

    /// Declares a field from an existing snake_case column; the field name
    /// is its camelCase form.
    pub fn for_column(column: impl Into<String>, sql_type: SqlType) -> Self {
        let column = column.into();
        Self::new(convert_to_camel_case(&column), sql_type).column(column)
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// Declared metadata for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    pub type_name: String,
    /// Explicit table name; defaults to the snake_case type name.
    pub table: Option<String>,
    pub fields: Vec<FieldDef>,
    /// Explicit key strategy; defaults by identity type.
    pub key_strategy: Option<KeyStrategy>,
}

impl EntityDefinition {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            fields: Vec::new(),
            key_strategy: None,
        }
    }

    /// Starts a definition named after `T` without its module path.
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(short_type_name(std::any::type_name::<T>()))
    }

    /// Starts a definition for an existing table; the type name is the
    /// PascalCase form of the table name.
    pub fn for_table(table: impl Into<String>) -> Self {
        let table = table.into();
        Self::new(capitalize(&convert_to_camel_case(&table))).table(table)
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for an identity field.
    pub fn id(self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.field(FieldDef::new(name, sql_type).identity())
    }

    /// Shorthand for a non-nullable field.
    pub fn column(self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.field(FieldDef::new(name, sql_type))
    }

    /// Shorthand for a nullable field.
    pub fn nullable(self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.field(FieldDef::new(name, sql_type).nullable())
    }

    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = Some(strategy);
        self
    }
}
