//! DDL rendering for external migration tooling and test fixtures.

use super::EntitySchema;
use crate::model::entity::KeyStrategy;

impl EntitySchema {
    /// Renders `CREATE TABLE IF NOT EXISTS` for this schema.
    ///
    /// A generated key becomes SQLite's `INTEGER PRIMARY KEY` rowid alias.
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns()
            .iter()
            .map(|column| {
                let storage = column.sql_type.storage_type();
                if column.primary_key {
                    match self.key_strategy() {
                        KeyStrategy::Generated => format!("{} INTEGER PRIMARY KEY", column.name),
                        KeyStrategy::Assigned => {
                            format!("{} {storage} PRIMARY KEY NOT NULL", column.name)
                        }
                    }
                } else if column.nullable {
                    format!("{} {storage}", column.name)
                } else {
                    format!("{} {storage} NOT NULL", column.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({columns});",
            self.table_name()
        )
    }
}
