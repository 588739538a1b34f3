//! Statement execution against a borrowed connection.
//!
//! Store failures are returned as-is; nothing here retries or logs errors.

use crate::db::DbResult;
use crate::mapper::Row;
use crate::query::Statement;
use log::debug;
use rusqlite::types::Value as SqliteValue;
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

/// Runs a row-returning statement and materializes every row.
pub(crate) fn query_rows(conn: &Connection, statement: &Statement) -> DbResult<Vec<Row>> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare_cached(&statement.sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = stmt.query(params_from_iter(statement.binds.iter()))?;
    let mut mapped = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Row::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            values.push(column.as_str(), SqliteValue::from(row.get_ref(index)?));
        }
        mapped.push(values);
    }

    debug!(
        "event=statement_exec module=repo status=ok kind=query rows={} duration_ms={} sql=\"{}\"",
        mapped.len(),
        started_at.elapsed().as_millis(),
        statement.sql
    );
    Ok(mapped)
}

/// Runs a single-value statement such as `SELECT COUNT(*)` or
/// `INSERT ... RETURNING <pk>`.
pub(crate) fn query_i64(conn: &Connection, statement: &Statement) -> DbResult<i64> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare_cached(&statement.sql)?;
    let value = stmt.query_row(params_from_iter(statement.binds.iter()), |row| {
        row.get::<_, i64>(0)
    })?;

    debug!(
        "event=statement_exec module=repo status=ok kind=scalar duration_ms={} sql=\"{}\"",
        started_at.elapsed().as_millis(),
        statement.sql
    );
    Ok(value)
}

/// Runs a write statement and returns the affected row count.
pub(crate) fn execute(conn: &Connection, statement: &Statement) -> DbResult<usize> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare_cached(&statement.sql)?;
    let changed = stmt.execute(params_from_iter(statement.binds.iter()))?;

    debug!(
        "event=statement_exec module=repo status=ok kind=write changed={} duration_ms={} sql=\"{}\"",
        changed,
        started_at.elapsed().as_millis(),
        statement.sql
    );
    Ok(changed)
}
