//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply the pragmas requested by [`DbConfig`].
//!
//! # Invariants
//! - Returned connections have the configured busy timeout, foreign-key
//!   enforcement and journal mode applied.

use super::DbResult;
use crate::config::DbConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file and configures it.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, config: &DbConfig) -> DbResult<Connection> {
    open_with("file", config, || Connection::open(path))
}

/// Opens a private in-memory SQLite database and configures it.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(config: &DbConfig) -> DbResult<Connection> {
    open_with("memory", config, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    config: &DbConfig,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    match configure_connection(&conn, config) {
        Ok(journal_mode) => {
            info!(
                "event=db_open module=db status=ok mode={mode} journal_mode={journal_mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_configure_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err.into())
        }
    }
}

/// Applies pragmas and returns the journal mode SQLite actually chose.
fn configure_connection(conn: &Connection, config: &DbConfig) -> rusqlite::Result<String> {
    conn.busy_timeout(config.busy_timeout())?;
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    // In-memory databases report `memory` whatever mode is requested.
    conn.pragma_update_and_check(
        None,
        "journal_mode",
        config.journal_mode.as_pragma(),
        |row| row.get::<_, String>(0),
    )
}
