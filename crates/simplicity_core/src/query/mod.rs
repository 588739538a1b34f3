//! Parameterized statement generation from an entity schema.
//!
//! # Responsibility
//! - Render SQL text for every repository operation.
//! - Produce bind values in the exact order of their `?` placeholders.
//!
//! # Invariants
//! - Values are never inlined into SQL text; only schema identifiers are.
//! - Column lists and write binds follow `EntitySchema::columns()` order.
//! - Unknown filter or sort columns are rejected before any SQL exists.

use crate::model::entity::KeyStrategy;
use crate::model::value::Value;
use crate::schema::EntitySchema;

mod criteria;

pub use criteria::{Criteria, Direction, Order, Pageable, Sort};

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("criteria column `{column}` is not part of table `{table}`")]
    InvalidCriteria { table: String, column: String },
    #[error("sort column `{column}` is not part of table `{table}`")]
    InvalidSort { table: String, column: String },
    #[error("statement for `{table}` expects {expected} row values, got {found}")]
    RowArity {
        table: String,
        expected: usize,
        found: usize,
    },
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

/// SQL text plus ordered bind values, built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Statement {
    fn new(sql: String, binds: Vec<Value>) -> Self {
        Self { sql, binds }
    }
}

/// Repository operation to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    FindById(Value),
    FindAll,
    FindBy(Criteria),
    FindSorted { criteria: Criteria, sort: Sort },
    FindPage { criteria: Criteria, page: Pageable },
    FindAllById(Vec<Value>),
    Count(Criteria),
    Exists(Value),
    /// `row` is ordered like the schema columns; a generated key omits the
    /// primary-key column and its value and returns the stored key instead.
    Insert { row: Vec<Value>, key: KeyStrategy },
    /// `row` is ordered like the schema columns, primary key included.
    Update(Vec<Value>),
    DeleteById(Value),
}

/// Renders `operation` against `schema`.
///
/// # Errors
/// - `InvalidCriteria` / `InvalidSort` for columns outside the schema.
/// - `RowArity` when a write row does not match the column count.
/// - `InvalidPageSize` for a zero page size.
pub fn build(schema: &EntitySchema, operation: &Operation) -> QueryResult<Statement> {
    match operation {
        Operation::FindById(id) => Ok(find_by_id(schema, id.clone())),
        Operation::FindAll => Ok(find_all(schema)),
        Operation::FindBy(criteria) => find_by(schema, criteria),
        Operation::FindSorted { criteria, sort } => select(schema, criteria, sort, None),
        Operation::FindPage { criteria, page } => {
            if page.size == 0 {
                return Err(QueryError::InvalidPageSize);
            }
            select(schema, criteria, &page.sort, Some(page))
        }
        Operation::FindAllById(ids) => Ok(find_all_by_ids(schema, ids)),
        Operation::Count(criteria) => count(schema, criteria),
        Operation::Exists(id) => Ok(exists(schema, id.clone())),
        Operation::Insert { row, key } => insert(schema, row, *key),
        Operation::Update(row) => update(schema, row),
        Operation::DeleteById(id) => Ok(delete_by_id(schema, id.clone())),
    }
}

/// `SELECT <columns> FROM <table> WHERE <pk> = ?`
pub fn find_by_id(schema: &EntitySchema, id: Value) -> Statement {
    Statement::new(
        format!(
            "SELECT {} FROM {} WHERE {} = ?",
            schema.select_list(),
            schema.table_name(),
            schema.primary_key().name
        ),
        vec![id],
    )
}

/// `SELECT <columns> FROM <table>`
pub fn find_all(schema: &EntitySchema) -> Statement {
    Statement::new(select_prefix(schema), Vec::new())
}

/// `SELECT <columns> FROM <table> WHERE c1 = ? AND c2 = ?`, in criteria order.
pub fn find_by(schema: &EntitySchema, criteria: &Criteria) -> QueryResult<Statement> {
    select(schema, criteria, &Sort::unsorted(), None)
}

pub fn find_all_by_ids(schema: &EntitySchema, ids: &[Value]) -> Statement {
    let mut sql = select_prefix(schema);
    if ids.is_empty() {
        sql.push_str(" WHERE 1 = 0");
        return Statement::new(sql, Vec::new());
    }
    sql.push_str(&format!(
        " WHERE {} IN ({})",
        schema.primary_key().name,
        placeholders(ids.len())
    ));
    Statement::new(sql, ids.to_vec())
}

pub fn count(schema: &EntitySchema, criteria: &Criteria) -> QueryResult<Statement> {
    let mut sql = format!("SELECT COUNT(*) FROM {}", schema.table_name());
    let mut binds = Vec::with_capacity(criteria.len());
    push_where(schema, criteria, &mut sql, &mut binds)?;
    Ok(Statement::new(sql, binds))
}

pub fn exists(schema: &EntitySchema, id: Value) -> Statement {
    Statement::new(
        format!(
            "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
            schema.table_name(),
            schema.primary_key().name
        ),
        vec![id],
    )
}

/// `INSERT INTO <table> (<columns>) VALUES (?, ...)`
///
/// A generated key omits the key column and appends `RETURNING <pk>`, so
/// the stored key is read back from the statement itself. With no other
/// columns left the row is written with `DEFAULT VALUES`.
pub fn insert(schema: &EntitySchema, row: &[Value], key: KeyStrategy) -> QueryResult<Statement> {
    ensure_arity(schema, row)?;
    let include_key = key == KeyStrategy::Assigned;
    let mut names = Vec::with_capacity(row.len());
    let mut binds = Vec::with_capacity(row.len());
    for (column, value) in schema.columns().iter().zip(row) {
        if column.primary_key && !include_key {
            continue;
        }
        names.push(column.name.as_str());
        binds.push(value.clone());
    }
    let mut sql = if names.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", schema.table_name())
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table_name(),
            names.join(", "),
            placeholders(binds.len())
        )
    };
    if !include_key {
        sql.push_str(&format!(" RETURNING {}", schema.primary_key().name));
    }
    Ok(Statement::new(sql, binds))
}

/// `UPDATE <table> SET c = ?, ... WHERE <pk> = ?`, key bound last.
///
/// A key-only schema renders `SET <pk> = <pk>` so the statement still
/// reports whether the key matched a row.
pub fn update(schema: &EntitySchema, row: &[Value]) -> QueryResult<Statement> {
    ensure_arity(schema, row)?;
    let mut assignments = Vec::with_capacity(row.len());
    let mut binds = Vec::with_capacity(row.len());
    for (column, value) in schema.columns().iter().zip(row) {
        if column.primary_key {
            continue;
        }
        assignments.push(format!("{} = ?", column.name));
        binds.push(value.clone());
    }
    if assignments.is_empty() {
        let key = &schema.primary_key().name;
        assignments.push(format!("{key} = {key}"));
    }
    binds.push(row[schema.primary_key_index()].clone());
    Ok(Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            schema.table_name(),
            assignments.join(", "),
            schema.primary_key().name
        ),
        binds,
    ))
}

/// `DELETE FROM <table> WHERE <pk> = ?`
pub fn delete_by_id(schema: &EntitySchema, id: Value) -> Statement {
    Statement::new(
        format!(
            "DELETE FROM {} WHERE {} = ?",
            schema.table_name(),
            schema.primary_key().name
        ),
        vec![id],
    )
}

fn select(
    schema: &EntitySchema,
    criteria: &Criteria,
    sort: &Sort,
    page: Option<&Pageable>,
) -> QueryResult<Statement> {
    let mut sql = select_prefix(schema);
    let mut binds = Vec::with_capacity(criteria.len() + 2);
    push_where(schema, criteria, &mut sql, &mut binds)?;
    push_order_by(schema, sort, &mut sql)?;
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        binds.push(Value::Integer(i64::from(page.size)));
        binds.push(Value::Integer(
            i64::try_from(page.offset()).unwrap_or(i64::MAX),
        ));
    }
    Ok(Statement::new(sql, binds))
}

fn select_prefix(schema: &EntitySchema) -> String {
    format!(
        "SELECT {} FROM {}",
        schema.select_list(),
        schema.table_name()
    )
}

fn push_where(
    schema: &EntitySchema,
    criteria: &Criteria,
    sql: &mut String,
    binds: &mut Vec<Value>,
) -> QueryResult<()> {
    let mut conditions = Vec::with_capacity(criteria.len());
    for (column, value) in criteria.iter() {
        if !schema.has_column(column) {
            return Err(QueryError::InvalidCriteria {
                table: schema.table_name().to_string(),
                column: column.to_string(),
            });
        }
        if value.is_null() {
            conditions.push(format!("{column} IS NULL"));
        } else {
            conditions.push(format!("{column} = ?"));
            binds.push(value.clone());
        }
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    Ok(())
}

fn push_order_by(schema: &EntitySchema, sort: &Sort, sql: &mut String) -> QueryResult<()> {
    if sort.is_unsorted() {
        return Ok(());
    }
    let mut terms = Vec::with_capacity(sort.orders().len());
    for order in sort.orders() {
        if !schema.has_column(&order.column) {
            return Err(QueryError::InvalidSort {
                table: schema.table_name().to_string(),
                column: order.column.clone(),
            });
        }
        terms.push(format!("{} {}", order.column, order.direction.as_sql()));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&terms.join(", "));
    Ok(())
}

fn ensure_arity(schema: &EntitySchema, row: &[Value]) -> QueryResult<()> {
    let expected = schema.columns().len();
    if row.len() == expected {
        return Ok(());
    }
    Err(QueryError::RowArity {
        table: schema.table_name().to_string(),
        expected,
        found: row.len(),
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
