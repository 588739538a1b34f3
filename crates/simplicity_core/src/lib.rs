//! Generic entity persistence over SQLite.
//!
//! Entity types declare their fields once ([`Entity`]); the crate derives a
//! cached [`EntitySchema`], renders parameterized SQL for each repository
//! operation and maps rows back into typed values.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod query;
pub mod repo;
pub mod schema;

pub use config::{default_log_level, DbConfig, JournalMode, LoggingConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LoggingError};
pub use mapper::{to_entity, to_row, MapResult, MappingError, Row};
pub use model::entity::{Entity, EntityDefinition, FieldDef, KeyStrategy};
pub use model::record::Record;
pub use model::value::{FromValue, SqlType, Value};
pub use query::{
    Criteria, Direction, Operation, Order, Pageable, QueryError, QueryResult, Sort, Statement,
};
pub use repo::entity_repo::{Page, RepoError, RepoResult, Repository, SqliteRepository};
pub use schema::{ColumnSchema, EntitySchema, SchemaError, SchemaRegistry, SchemaResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
