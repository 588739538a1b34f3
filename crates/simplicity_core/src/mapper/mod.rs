//! Schema-driven row mapping.
//!
//! # Responsibility
//! - Decode one result row into an entity instance.
//! - Encode one entity instance into ordered column values for writes.
//!
//! # Invariants
//! - Both directions walk [`EntitySchema::columns`] in declared order; no
//!   column is skipped on read and no field is skipped on write.
//! - Storage decoding is strict: a value that does not fit the column's
//!   semantic type is an error, never a silent default.

use crate::model::entity::Entity;
use crate::model::record::Record;
use crate::model::value::{
    SqlType, Value, DATE_FORMAT, TIMESTAMP_FORMAT, TIMESTAMP_FORMAT_ISO_T, TIME_FORMAT,
};
use crate::schema::{ColumnSchema, EntitySchema};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value as SqliteValue;
use uuid::Uuid;

pub type MapResult<T> = Result<T, MappingError>;

/// Row/entity conversion failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("row from `{table}` is missing column `{column}`")]
    MissingColumn { table: String, column: String },
    #[error("column `{table}.{column}` holds {found}, which does not convert to {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: SqlType,
        found: String,
    },
    #[error("column `{table}.{column}` is not nullable but is NULL")]
    UnexpectedNull { table: String, column: String },
    #[error("entity record is missing field `{field}`")]
    MissingField { field: String },
    #[error("field `{field}` expects {expected} but holds {found}")]
    FieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid value for field `{field}`: {message}")]
    InvalidValue { field: String, message: String },
}

/// One result row: ordered `(column name, raw storage value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqliteValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Builds a row from values ordered like `schema.columns()`.
    ///
    /// Extra values are ignored; missing ones leave the column absent.
    pub fn from_values(schema: &EntitySchema, values: &[Value]) -> Self {
        let mut row = Self::with_capacity(values.len());
        for (column, value) in schema.columns().iter().zip(values) {
            row.push(column.name.clone(), value.to_storage());
        }
        row
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqliteValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&SqliteValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Decodes `row` into an `E` using `schema`.
///
/// # Errors
/// Returns [`MappingError`] when a column is missing, NULL where not
/// allowed, not convertible to its semantic type, or when `E` rejects the
/// decoded record.
pub fn to_entity<E: Entity>(schema: &EntitySchema, row: &Row) -> MapResult<E> {
    let mut record = Record::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let raw = row
            .get(&column.name)
            .ok_or_else(|| MappingError::MissingColumn {
                table: schema.table_name().to_string(),
                column: column.name.clone(),
            })?;
        record.set(column.field.clone(), decode_column(schema, column, raw)?);
    }
    E::from_record(&record)
}

/// Encodes `entity` into values ordered like `schema.columns()`.
///
/// The identity column may hold an absent key (NULL or zero); every other
/// column must match its declared type and nullability.
///
/// # Errors
/// Returns [`MappingError`] when the entity's record lacks a declared
/// field or a value does not fit its column.
pub fn to_row<E: Entity>(schema: &EntitySchema, entity: &E) -> MapResult<Vec<Value>> {
    let record = entity.to_record();
    schema
        .columns()
        .iter()
        .map(|column| {
            let value = record
                .value(&column.field)
                .ok_or_else(|| MappingError::MissingField {
                    field: column.field.clone(),
                })?;
            encode_column(schema, column, value)
        })
        .collect()
}

fn encode_column(schema: &EntitySchema, column: &ColumnSchema, value: &Value) -> MapResult<Value> {
    match (value, column.sql_type) {
        (Value::Null, _) if column.nullable || column.primary_key => Ok(Value::Null),
        (Value::Null, _) => Err(MappingError::UnexpectedNull {
            table: schema.table_name().to_string(),
            column: column.name.clone(),
        }),
        #[allow(clippy::cast_precision_loss)]
        (Value::Integer(number), SqlType::Real) => Ok(Value::Real(*number as f64)),
        (other, expected) if other.sql_type() == Some(expected) => Ok(other.clone()),
        (other, expected) => Err(MappingError::ColumnType {
            table: schema.table_name().to_string(),
            column: column.name.clone(),
            expected,
            found: other.kind_name().to_string(),
        }),
    }
}

/// Converts one raw storage value into the column's semantic value.
fn decode_column(
    schema: &EntitySchema,
    column: &ColumnSchema,
    raw: &SqliteValue,
) -> MapResult<Value> {
    if matches!(raw, SqliteValue::Null) {
        if column.nullable {
            return Ok(Value::Null);
        }
        return Err(MappingError::UnexpectedNull {
            table: schema.table_name().to_string(),
            column: column.name.clone(),
        });
    }

    let decoded = match (column.sql_type, raw) {
        (SqlType::Integer, SqliteValue::Integer(value)) => Some(Value::Integer(*value)),
        (SqlType::Real, SqliteValue::Real(value)) => Some(Value::Real(*value)),
        #[allow(clippy::cast_precision_loss)]
        (SqlType::Real, SqliteValue::Integer(value)) => Some(Value::Real(*value as f64)),
        (SqlType::Text, SqliteValue::Text(value)) => Some(Value::Text(value.clone())),
        (SqlType::Boolean, SqliteValue::Integer(0)) => Some(Value::Boolean(false)),
        (SqlType::Boolean, SqliteValue::Integer(1)) => Some(Value::Boolean(true)),
        (SqlType::Date, SqliteValue::Text(value)) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        (SqlType::Time, SqliteValue::Text(value)) => NaiveTime::parse_from_str(value, TIME_FORMAT)
            .ok()
            .map(Value::Time),
        (SqlType::Timestamp, SqliteValue::Text(value)) => parse_timestamp(value).map(Value::Timestamp),
        (SqlType::Uuid, SqliteValue::Text(value)) => Uuid::parse_str(value).ok().map(Value::Uuid),
        (SqlType::Uuid, SqliteValue::Blob(bytes)) => {
            Uuid::from_slice(bytes).ok().map(Value::Uuid)
        }
        (SqlType::Blob, SqliteValue::Blob(bytes)) => Some(Value::Blob(bytes.clone())),
        _ => None,
    };

    decoded.ok_or_else(|| MappingError::ColumnType {
        table: schema.table_name().to_string(),
        column: column.name.clone(),
        expected: column.sql_type,
        found: describe_storage(raw),
    })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_ISO_T))
        .ok()
}

fn describe_storage(raw: &SqliteValue) -> String {
    const MAX_TEXT_CHARS: usize = 32;
    match raw {
        SqliteValue::Null => "NULL".to_string(),
        SqliteValue::Integer(value) => format!("INTEGER {value}"),
        SqliteValue::Real(value) => format!("REAL {value}"),
        SqliteValue::Text(value) => {
            let mut shown: String = value.chars().take(MAX_TEXT_CHARS).collect();
            if value.chars().count() > MAX_TEXT_CHARS {
                shown.push_str("...");
            }
            format!("TEXT `{shown}`")
        }
        SqliteValue::Blob(bytes) => format!("BLOB ({} bytes)", bytes.len()),
    }
}
