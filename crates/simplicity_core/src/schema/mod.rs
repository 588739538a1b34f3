//! Entity schema derivation.
//!
//! # Responsibility
//! - Turn a declared [`EntityDefinition`] into an immutable [`EntitySchema`].
//! - Reject entity types that cannot be persisted.
//!
//! # Invariants
//! - Derivation is pure: the same definition always yields the same schema.
//! - Column order is the declared field order (transient fields removed);
//!   the query builder and the row mapper both rely on it.
//! - Every schema has exactly one primary-key column, never nullable.

use crate::model::entity::{EntityDefinition, KeyStrategy};
use crate::model::value::SqlType;
use crate::naming::{convert_to_snake_case, is_valid_identifier};
use serde::Serialize;
use std::collections::HashSet;

mod ddl;
pub mod registry;

pub use registry::SchemaRegistry;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Entity type is unsuitable for persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("entity `{entity}` has no identity field; mark one or declare a field named `id`")]
    MissingIdentity { entity: String },
    #[error("entity `{entity}` declares more than one identity field: {fields:?}")]
    AmbiguousIdentity { entity: String, fields: Vec<String> },
    #[error("entity `{entity}` has no persistable fields")]
    NoPersistableFields { entity: String },
    #[error("entity `{entity}` uses invalid SQL identifier `{identifier}`")]
    InvalidIdentifier { entity: String, identifier: String },
    #[error("entity `{entity}` maps more than one field to column `{column}`")]
    DuplicateColumn { entity: String, column: String },
    #[error("entity `{entity}` declares a generated key on {sql_type} column `{column}`")]
    UnsupportedGeneratedKey {
        entity: String,
        column: String,
        sql_type: SqlType,
    },
}

/// One persisted column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Entity field this column reads from and writes to.
    pub field: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Derived, immutable description of how one entity type maps to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    entity: String,
    table: String,
    columns: Vec<ColumnSchema>,
    primary_key: usize,
    key_strategy: KeyStrategy,
}

impl EntitySchema {
    /// Derives a schema from declared entity metadata.
    ///
    /// # Errors
    /// Returns [`SchemaError`] when the definition has no persistable field,
    /// no (or several) identity fields, invalid identifiers, duplicate
    /// columns, or a generated key on a non-integer identity.
    pub fn derive(definition: &EntityDefinition) -> SchemaResult<Self> {
        let entity = definition.type_name.clone();
        let table = definition
            .table
            .clone()
            .unwrap_or_else(|| convert_to_snake_case(&definition.type_name));
        ensure_identifier(&entity, &table)?;

        let persistable: Vec<_> = definition
            .fields
            .iter()
            .filter(|field| !field.transient)
            .collect();
        if persistable.is_empty() {
            return Err(SchemaError::NoPersistableFields { entity });
        }

        let marked: Vec<usize> = persistable
            .iter()
            .enumerate()
            .filter(|(_, field)| field.identity)
            .map(|(index, _)| index)
            .collect();
        let primary_key = match marked.as_slice() {
            [single] => *single,
            [] => persistable
                .iter()
                .position(|field| field.name == "id")
                .ok_or_else(|| SchemaError::MissingIdentity {
                    entity: entity.clone(),
                })?,
            many => {
                return Err(SchemaError::AmbiguousIdentity {
                    entity,
                    fields: many
                        .iter()
                        .map(|index| persistable[*index].name.clone())
                        .collect(),
                });
            }
        };

        let mut seen = HashSet::with_capacity(persistable.len());
        let mut columns = Vec::with_capacity(persistable.len());
        for (index, field) in persistable.iter().enumerate() {
            let name = field
                .column
                .clone()
                .unwrap_or_else(|| convert_to_snake_case(&field.name));
            ensure_identifier(&entity, &name)?;
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateColumn {
                    entity,
                    column: name,
                });
            }
            let is_key = index == primary_key;
            columns.push(ColumnSchema {
                name,
                field: field.name.clone(),
                sql_type: field.sql_type,
                nullable: field.nullable && !is_key,
                primary_key: is_key,
            });
        }

        let key_column = &columns[primary_key];
        let key_strategy = definition.key_strategy.unwrap_or(match key_column.sql_type {
            SqlType::Integer => KeyStrategy::Generated,
            _ => KeyStrategy::Assigned,
        });
        if key_strategy == KeyStrategy::Generated && key_column.sql_type != SqlType::Integer {
            return Err(SchemaError::UnsupportedGeneratedKey {
                entity,
                column: key_column.name.clone(),
                sql_type: key_column.sql_type,
            });
        }

        Ok(Self {
            entity,
            table,
            columns,
            primary_key,
            key_strategy,
        })
    }

    /// Entity type name the schema was derived from.
    pub fn entity_name(&self) -> &str {
        &self.entity
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Columns in declared order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key(&self) -> &ColumnSchema {
        &self.columns[self.primary_key]
    }

    /// Position of the primary key within [`EntitySchema::columns`].
    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    /// Columns other than the primary key, in declared order.
    pub fn non_key_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|column| !column.primary_key)
    }

    /// Comma separated column list used by every SELECT.
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn ensure_identifier(entity: &str, identifier: &str) -> SchemaResult<()> {
    if is_valid_identifier(identifier) {
        return Ok(());
    }
    Err(SchemaError::InvalidIdentifier {
        entity: entity.to_string(),
        identifier: identifier.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{EntitySchema, SchemaError};
    use crate::model::entity::{EntityDefinition, FieldDef, KeyStrategy};
    use crate::model::value::SqlType;

    fn person() -> EntityDefinition {
        EntityDefinition::new("PersonRecord")
            .column("id", SqlType::Integer)
            .column("fullName", SqlType::Text)
            .nullable("age", SqlType::Integer)
    }

    #[test]
    fn derives_snake_case_names_and_infers_id() {
        let schema = EntitySchema::derive(&person()).unwrap();

        assert_eq!(schema.table_name(), "person_record");
        assert_eq!(schema.select_list(), "id, full_name, age");
        assert_eq!(schema.primary_key().name, "id");
        assert_eq!(schema.primary_key_index(), 0);
        assert_eq!(schema.key_strategy(), KeyStrategy::Generated);
        assert_eq!(schema.column("full_name").unwrap().field, "fullName");
        assert!(schema.column("age").unwrap().nullable);
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(
            EntitySchema::derive(&person()).unwrap(),
            EntitySchema::derive(&person()).unwrap()
        );
    }

    #[test]
    fn transient_fields_are_not_columns() {
        let definition = person().field(FieldDef::new("display", SqlType::Text).transient());
        let schema = EntitySchema::derive(&definition).unwrap();
        assert_eq!(schema.columns().len(), 3);
        assert!(!schema.has_column("display"));
    }

    #[test]
    fn identity_is_never_nullable() {
        let definition = EntityDefinition::new("Code")
            .field(FieldDef::new("code", SqlType::Text).identity().nullable());
        let schema = EntitySchema::derive(&definition).unwrap();
        assert!(!schema.primary_key().nullable);
        assert_eq!(schema.key_strategy(), KeyStrategy::Assigned);
    }

    #[test]
    fn rejects_missing_and_ambiguous_identity() {
        let missing = EntityDefinition::new("Note").column("body", SqlType::Text);
        assert!(matches!(
            EntitySchema::derive(&missing),
            Err(SchemaError::MissingIdentity { .. })
        ));

        let ambiguous = EntityDefinition::new("Pair")
            .id("left", SqlType::Integer)
            .id("right", SqlType::Integer);
        assert_eq!(
            EntitySchema::derive(&ambiguous).unwrap_err(),
            SchemaError::AmbiguousIdentity {
                entity: "Pair".to_string(),
                fields: vec!["left".to_string(), "right".to_string()],
            }
        );
    }

    #[test]
    fn rejects_entity_without_persistable_fields() {
        let empty = EntityDefinition::new("Empty");
        assert!(matches!(
            EntitySchema::derive(&empty),
            Err(SchemaError::NoPersistableFields { .. })
        ));

        let only_transient = EntityDefinition::new("Ghost")
            .field(FieldDef::new("id", SqlType::Integer).transient());
        assert!(matches!(
            EntitySchema::derive(&only_transient),
            Err(SchemaError::NoPersistableFields { .. })
        ));
    }

    #[test]
    fn rejects_invalid_identifiers_and_duplicate_columns() {
        let bad_table = person().table("person; DROP TABLE x");
        assert!(matches!(
            EntitySchema::derive(&bad_table),
            Err(SchemaError::InvalidIdentifier { .. })
        ));

        let duplicate = person().field(FieldDef::new("fullName2", SqlType::Text).column("full_name"));
        assert_eq!(
            EntitySchema::derive(&duplicate).unwrap_err(),
            SchemaError::DuplicateColumn {
                entity: "PersonRecord".to_string(),
                column: "full_name".to_string(),
            }
        );
    }

    #[test]
    fn rejects_generated_key_on_text_identity() {
        let definition = EntityDefinition::new("Slug")
            .id("slug", SqlType::Text)
            .key_strategy(KeyStrategy::Generated);
        assert!(matches!(
            EntitySchema::derive(&definition),
            Err(SchemaError::UnsupportedGeneratedKey {
                sql_type: SqlType::Text,
                ..
            })
        ));
    }
}
