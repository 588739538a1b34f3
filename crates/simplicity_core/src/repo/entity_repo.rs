//! Generic entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, criteria, sorting and paging APIs over any entity type.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save` inserts when the identity is absent and updates otherwise.
//! - A key lookup returning more than one row is a data integrity error,
//!   never a silently picked row.
//! - Deleting a missing key is `false`, not an error.

use super::executor::{execute, query_i64, query_rows};
use crate::db::DbError;
use crate::mapper::{self, MappingError, Row};
use crate::model::entity::{Entity, KeyStrategy};
use crate::model::value::Value;
use crate::query::{self, Criteria, Operation, Pageable, QueryError, Sort, Statement};
use crate::schema::{EntitySchema, SchemaError, SchemaRegistry};
use rusqlite::Connection;
use std::marker::PhantomData;
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error covering every layer a call passes through.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("data integrity violated on `{table}`: {detail}")]
    DataIntegrity { table: String, detail: String },
    #[error("no record updated in `{table}` for key {key}")]
    NoRecordUpdated { table: String, key: String },
    #[error("entity for `{table}` has no identity value; assigned keys must be set before writing")]
    MissingIdentity { table: String },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One page of results plus the total matching the page's criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Repository interface for one entity type.
pub trait Repository<E: Entity> {
    fn find_by_id(&self, id: impl Into<Value>) -> RepoResult<Option<E>>;
    fn find_all(&self) -> RepoResult<Vec<E>>;
    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<E>>;
    fn find_all_by_ids<I, V>(&self, ids: I) -> RepoResult<Vec<E>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>;
    fn find_by(&self, criteria: &Criteria) -> RepoResult<Vec<E>>;
    fn find_page(&self, criteria: &Criteria, page: &Pageable) -> RepoResult<Page<E>>;
    fn count(&self) -> RepoResult<u64>;
    fn count_by(&self, criteria: &Criteria) -> RepoResult<u64>;
    fn exists(&self, id: impl Into<Value>) -> RepoResult<bool>;
    /// Inserts when the identity is absent, updates otherwise.
    fn save(&self, entity: E) -> RepoResult<E>;
    /// Saves each entity in order; stops at the first failure.
    fn save_all<I>(&self, entities: I) -> RepoResult<Vec<E>>
    where
        I: IntoIterator<Item = E>;
    /// Always inserts; a generated key is filled in on return.
    fn create(&self, entity: E) -> RepoResult<E>;
    /// Always updates; fails when no row has the entity's key.
    fn update(&self, entity: &E) -> RepoResult<()>;
    fn delete_by_id(&self, id: impl Into<Value>) -> RepoResult<bool>;
}

/// SQLite-backed repository over a caller-managed connection.
///
/// Works equally over a `rusqlite::Transaction`, which derefs to a
/// connection; transaction scope stays with the caller.
pub struct SqliteRepository<'conn, E: Entity> {
    conn: &'conn Connection,
    schema: Arc<EntitySchema>,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteRepository<'conn, E> {
    /// Binds a repository for `E` to `conn`, resolving `E`'s schema through
    /// `registry`.
    ///
    /// # Errors
    /// Returns `RepoError::Schema` when `E` cannot be persisted.
    pub fn try_new(conn: &'conn Connection, registry: &SchemaRegistry) -> RepoResult<Self> {
        let schema = registry.schema_for::<E>()?;
        Ok(Self {
            conn,
            schema,
            _entity: PhantomData,
        })
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn statement(&self, operation: &Operation) -> RepoResult<Statement> {
        Ok(query::build(&self.schema, operation)?)
    }

    fn fetch(&self, operation: &Operation) -> RepoResult<Vec<E>> {
        let statement = self.statement(operation)?;
        let rows = query_rows(self.conn, &statement)?;
        self.map_rows(&rows)
    }

    fn map_rows(&self, rows: &[Row]) -> RepoResult<Vec<E>> {
        rows.iter()
            .map(|row| mapper::to_entity::<E>(&self.schema, row).map_err(RepoError::from))
            .collect()
    }

    fn count_matching(&self, criteria: &Criteria) -> RepoResult<u64> {
        let statement = self.statement(&Operation::Count(criteria.clone()))?;
        let total = query_i64(self.conn, &statement)?;
        u64::try_from(total).map_err(|_| RepoError::DataIntegrity {
            table: self.schema.table_name().to_string(),
            detail: format!("negative row count {total}"),
        })
    }

    fn insert_row(&self, entity: E, row: Vec<Value>) -> RepoResult<E> {
        let key = &row[self.schema.primary_key_index()];
        let generate = match self.schema.key_strategy() {
            KeyStrategy::Generated => key.is_absent_key(),
            KeyStrategy::Assigned if key.is_absent_key() => {
                return Err(self.missing_identity());
            }
            KeyStrategy::Assigned => false,
        };
        let key_mode = if generate {
            KeyStrategy::Generated
        } else {
            KeyStrategy::Assigned
        };

        let statement = self.statement(&Operation::Insert { row, key: key_mode })?;
        if !generate {
            let changed = execute(self.conn, &statement)?;
            if changed != 1 {
                return Err(self.integrity(format!("insert affected {changed} rows")));
            }
            return Ok(entity);
        }

        let generated = query_i64(self.conn, &statement)?;
        let mut record = entity.to_record();
        record.set(self.schema.primary_key().field.clone(), generated);
        Ok(E::from_record(&record)?)
    }

    fn update_row(&self, row: Vec<Value>) -> RepoResult<()> {
        let key = row[self.schema.primary_key_index()].clone();
        if key.is_absent_key() {
            return Err(self.missing_identity());
        }
        let statement = self.statement(&Operation::Update(row))?;
        match execute(self.conn, &statement)? {
            0 => Err(RepoError::NoRecordUpdated {
                table: self.schema.table_name().to_string(),
                key: key.to_string(),
            }),
            1 => Ok(()),
            changed => Err(self.integrity(format!("update of key {key} affected {changed} rows"))),
        }
    }

    fn missing_identity(&self) -> RepoError {
        RepoError::MissingIdentity {
            table: self.schema.table_name().to_string(),
        }
    }

    fn integrity(&self, detail: String) -> RepoError {
        RepoError::DataIntegrity {
            table: self.schema.table_name().to_string(),
            detail,
        }
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<'_, E> {
    fn find_by_id(&self, id: impl Into<Value>) -> RepoResult<Option<E>> {
        let id = id.into();
        let mut found = self.fetch(&Operation::FindById(id.clone()))?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            rows => Err(self.integrity(format!("{rows} rows share primary key {id}"))),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<E>> {
        self.fetch(&Operation::FindAll)
    }

    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<E>> {
        self.fetch(&Operation::FindSorted {
            criteria: Criteria::new(),
            sort: sort.clone(),
        })
    }

    fn find_all_by_ids<I, V>(&self, ids: I) -> RepoResult<Vec<E>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(&Operation::FindAllById(ids))
    }

    fn find_by(&self, criteria: &Criteria) -> RepoResult<Vec<E>> {
        self.fetch(&Operation::FindBy(criteria.clone()))
    }

    fn find_page(&self, criteria: &Criteria, page: &Pageable) -> RepoResult<Page<E>> {
        let content = self.fetch(&Operation::FindPage {
            criteria: criteria.clone(),
            page: page.clone(),
        })?;
        let total = self.count_matching(criteria)?;
        Ok(Page {
            content,
            page: page.page,
            size: page.size,
            total,
        })
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_matching(&Criteria::new())
    }

    fn count_by(&self, criteria: &Criteria) -> RepoResult<u64> {
        self.count_matching(criteria)
    }

    fn exists(&self, id: impl Into<Value>) -> RepoResult<bool> {
        let statement = self.statement(&Operation::Exists(id.into()))?;
        Ok(!query_rows(self.conn, &statement)?.is_empty())
    }

    fn save(&self, entity: E) -> RepoResult<E> {
        let row = mapper::to_row(&self.schema, &entity)?;
        if row[self.schema.primary_key_index()].is_absent_key() {
            return self.insert_row(entity, row);
        }
        self.update_row(row)?;
        Ok(entity)
    }

    fn save_all<I>(&self, entities: I) -> RepoResult<Vec<E>>
    where
        I: IntoIterator<Item = E>,
    {
        entities
            .into_iter()
            .map(|entity| self.save(entity))
            .collect()
    }

    fn create(&self, entity: E) -> RepoResult<E> {
        let row = mapper::to_row(&self.schema, &entity)?;
        self.insert_row(entity, row)
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        let row = mapper::to_row(&self.schema, entity)?;
        self.update_row(row)
    }

    fn delete_by_id(&self, id: impl Into<Value>) -> RepoResult<bool> {
        let id = id.into();
        let statement = self.statement(&Operation::DeleteById(id.clone()))?;
        match execute(self.conn, &statement)? {
            0 => Ok(false),
            1 => Ok(true),
            rows => Err(self.integrity(format!("delete of key {id} removed {rows} rows"))),
        }
    }
}
