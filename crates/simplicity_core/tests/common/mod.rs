#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use simplicity_core::{
    open_db_in_memory, DbConfig, Entity, EntityDefinition, FieldDef, MapResult, Record,
    SchemaRegistry, SqlType,
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl Person {
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            age,
        }
    }
}

impl Entity for Person {
    fn definition() -> EntityDefinition {
        EntityDefinition::for_type::<Self>()
            .id("id", SqlType::Integer)
            .column("name", SqlType::Text)
            .column("age", SqlType::Integer)
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
            .with("age", self.age)
    }

    fn from_record(record: &Record) -> MapResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            name: record.get("name")?,
            age: record.get("age")?,
        })
    }
}

/// Assigned-key entity covering every non-integer semantic type.
#[derive(Debug, Clone, PartialEq)]
pub struct Gadget {
    pub serial: Uuid,
    pub label: String,
    pub weight: f64,
    pub active: bool,
    pub released_on: NaiveDate,
    pub opens_at: NaiveTime,
    pub checked_at: Option<NaiveDateTime>,
    pub note: Option<String>,
    pub firmware: Vec<u8>,
    /// Not persisted.
    pub cache_hits: u32,
}

impl Gadget {
    pub fn new(label: &str) -> Self {
        Self {
            serial: Uuid::new_v4(),
            label: label.to_string(),
            weight: 1.5,
            active: true,
            released_on: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            opens_at: NaiveTime::from_hms_micro_opt(8, 30, 5, 250).unwrap(),
            checked_at: None,
            note: None,
            firmware: vec![0xde, 0xad, 0xbe, 0xef],
            cache_hits: 0,
        }
    }
}

impl Entity for Gadget {
    fn definition() -> EntityDefinition {
        EntityDefinition::for_type::<Self>()
            .table("gadgets")
            .field(FieldDef::new("serial", SqlType::Uuid).identity())
            .column("label", SqlType::Text)
            .column("weight", SqlType::Real)
            .field(FieldDef::new("active", SqlType::Boolean).column("is_active"))
            .column("releasedOn", SqlType::Date)
            .column("opensAt", SqlType::Time)
            .nullable("checkedAt", SqlType::Timestamp)
            .nullable("note", SqlType::Text)
            .column("firmware", SqlType::Blob)
            .field(FieldDef::new("cache_hits", SqlType::Integer).transient())
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("serial", self.serial)
            .with("label", self.label.as_str())
            .with("weight", self.weight)
            .with("active", self.active)
            .with("releasedOn", self.released_on)
            .with("opensAt", self.opens_at)
            .with("checkedAt", self.checked_at)
            .with("note", self.note.clone())
            .with("firmware", self.firmware.clone())
    }

    fn from_record(record: &Record) -> MapResult<Self> {
        Ok(Self {
            serial: record.get("serial")?,
            label: record.get("label")?,
            weight: record.get("weight")?,
            active: record.get("active")?,
            released_on: record.get("releasedOn")?,
            opens_at: record.get("opensAt")?,
            checked_at: record.get("checkedAt")?,
            note: record.get("note")?,
            firmware: record.get("firmware")?,
            cache_hits: 0,
        })
    }
}

/// Opens an in-memory database with tables for `Person` and `Gadget`.
pub fn open_with_tables(registry: &SchemaRegistry) -> Connection {
    let conn = open_db_in_memory(&DbConfig::default()).unwrap();
    let person = registry.schema_for::<Person>().unwrap();
    let gadget = registry.schema_for::<Gadget>().unwrap();
    conn.execute_batch(&person.create_table_sql()).unwrap();
    conn.execute_batch(&gadget.create_table_sql()).unwrap();
    conn
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// Entity whose only persisted field is its generated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: i64,
}

impl Entity for Marker {
    fn definition() -> EntityDefinition {
        EntityDefinition::for_table("marker").field(FieldDef::for_column("id", SqlType::Integer))
    }

    fn to_record(&self) -> Record {
        Record::new().with("id", self.id)
    }

    fn from_record(record: &Record) -> MapResult<Self> {
        Ok(Self {
            id: record.get("id")?,
        })
    }
}
