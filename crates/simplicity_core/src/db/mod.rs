//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open file or in-memory connections configured from [`DbConfig`].
//! - Carry store failures to callers with the driver error intact.
//!
//! # Invariants
//! - The core never pools connections; every connection returned here is
//!   owned by the caller.
//! - Schema migration is out of scope; callers create tables themselves
//!   (see `EntitySchema::create_table_sql`).
//!
//! [`DbConfig`]: crate::config::DbConfig

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Store-execution failure, passed through uninterpreted.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
