mod common;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::{Gadget, Person};
use proptest::prelude::*;
use rusqlite::types::Value as SqliteValue;
use simplicity_core::{
    to_entity, to_row, Entity, EntityDefinition, MapResult, MappingError, Record, Row,
    SchemaRegistry, SqlType, Value,
};
use uuid::Uuid;

/// Entity that hands back whatever record it was built with.
#[derive(Debug, Clone, PartialEq)]
struct Raw(Record);

impl Entity for Raw {
    fn definition() -> EntityDefinition {
        EntityDefinition::for_type::<Self>()
            .id("id", SqlType::Integer)
            .column("name", SqlType::Text)
            .nullable("score", SqlType::Real)
    }

    fn to_record(&self) -> Record {
        self.0.clone()
    }

    fn from_record(record: &Record) -> MapResult<Self> {
        Ok(Self(record.clone()))
    }
}

fn gadget_row(registry: &SchemaRegistry, gadget: &Gadget) -> Row {
    let schema = registry.schema_for::<Gadget>().unwrap();
    Row::from_values(&schema, &to_row(&schema, gadget).unwrap())
}

fn replace(row: &Row, column: &str, value: SqliteValue) -> Row {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Gadget>().unwrap();
    let mut replaced = Row::new();
    for name in schema.columns().iter().map(|column| column.name.as_str()) {
        let current = if name == column {
            value.clone()
        } else {
            row.get(name).cloned().unwrap()
        };
        replaced.push(name, current);
    }
    replaced
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (700_000_i32..800_000).prop_map(|days| NaiveDate::from_num_days_from_ce_opt(days).unwrap())
}

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (0_u32..24, 0_u32..60, 0_u32..60, 0_u32..1_000_000).prop_map(|(hour, minute, second, micro)| {
        NaiveTime::from_hms_micro_opt(hour, minute, second, micro).unwrap()
    })
}

fn arb_timestamp() -> impl Strategy<Value = NaiveDateTime> {
    (arb_date(), 0_u32..24, 0_u32..60, 0_u32..60, 0_u32..1_000_000).prop_map(
        |(date, hour, minute, second, micro)| {
            date.and_hms_micro_opt(hour, minute, second, micro).unwrap()
        },
    )
}

prop_compose! {
    fn arb_gadget()(
        serial in any::<[u8; 16]>(),
        label in ".*",
        weight in -1.0e12_f64..1.0e12,
        active in any::<bool>(),
        released_on in arb_date(),
        opens_at in arb_time(),
        checked_at in proptest::option::of(arb_timestamp()),
        note in proptest::option::of(".*"),
        firmware in proptest::collection::vec(any::<u8>(), 0..32),
    ) -> Gadget {
        Gadget {
            serial: Uuid::from_bytes(serial),
            label,
            weight,
            active,
            released_on,
            opens_at,
            checked_at,
            note,
            firmware,
            cache_hits: 0,
        }
    }
}

proptest! {
    #[test]
    fn person_survives_encode_then_decode(id in any::<i64>(), name in ".*", age in any::<i64>()) {
        let registry = SchemaRegistry::new();
        let schema = registry.schema_for::<Person>().unwrap();
        let person = Person { id, name, age };

        let row = Row::from_values(&schema, &to_row(&schema, &person).unwrap());
        prop_assert_eq!(to_entity::<Person>(&schema, &row).unwrap(), person);
    }

    #[test]
    fn gadget_survives_encode_then_decode(gadget in arb_gadget()) {
        let registry = SchemaRegistry::new();
        let schema = registry.schema_for::<Gadget>().unwrap();

        let row = gadget_row(&registry, &gadget);
        prop_assert_eq!(to_entity::<Gadget>(&schema, &row).unwrap(), gadget);
    }
}

#[test]
fn storage_encoding_uses_integer_booleans_and_text_temporals() {
    let registry = SchemaRegistry::new();
    let mut gadget = Gadget::new("probe");
    gadget.checked_at = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5);
    let row = gadget_row(&registry, &gadget);

    assert_eq!(row.get("is_active"), Some(&SqliteValue::Integer(1)));
    assert_eq!(
        row.get("released_on"),
        Some(&SqliteValue::Text("2020-05-17".to_string()))
    );
    assert_eq!(
        row.get("opens_at"),
        Some(&SqliteValue::Text("08:30:05.000250".to_string()))
    );
    assert_eq!(
        row.get("checked_at"),
        Some(&SqliteValue::Text("2024-01-02 03:04:05".to_string()))
    );
    assert_eq!(
        row.get("serial"),
        Some(&SqliteValue::Text(gadget.serial.hyphenated().to_string()))
    );
    assert_eq!(row.get("note"), Some(&SqliteValue::Null));
}

#[test]
fn missing_column_is_reported() {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Person>().unwrap();
    let mut row = Row::new();
    row.push("id", SqliteValue::Integer(1));
    row.push("name", SqliteValue::Text("Ana".to_string()));

    let err = to_entity::<Person>(&schema, &row).unwrap_err();
    assert_eq!(
        err,
        MappingError::MissingColumn {
            table: "person".to_string(),
            column: "age".to_string(),
        }
    );
}

#[test]
fn null_in_non_nullable_column_is_reported() {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Gadget>().unwrap();
    let row = replace(&gadget_row(&registry, &Gadget::new("x")), "label", SqliteValue::Null);

    let err = to_entity::<Gadget>(&schema, &row).unwrap_err();
    assert!(matches!(err, MappingError::UnexpectedNull { ref column, .. } if column == "label"));
}

#[test]
fn values_outside_the_semantic_type_are_rejected() {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Gadget>().unwrap();
    let row = gadget_row(&registry, &Gadget::new("x"));

    let bad_bool = replace(&row, "is_active", SqliteValue::Integer(2));
    let err = to_entity::<Gadget>(&schema, &bad_bool).unwrap_err();
    assert!(matches!(
        err,
        MappingError::ColumnType { ref column, expected: SqlType::Boolean, .. } if column == "is_active"
    ));

    let bad_date = replace(&row, "released_on", SqliteValue::Text("2024-13-01".to_string()));
    let err = to_entity::<Gadget>(&schema, &bad_date).unwrap_err();
    assert!(err.to_string().contains("2024-13-01"));

    let bad_time = replace(&row, "opens_at", SqliteValue::Text("25:00:00".to_string()));
    assert!(matches!(
        to_entity::<Gadget>(&schema, &bad_time).unwrap_err(),
        MappingError::ColumnType { expected: SqlType::Time, .. }
    ));

    let real_as_text = replace(&row, "weight", SqliteValue::Text("1.5".to_string()));
    assert!(to_entity::<Gadget>(&schema, &real_as_text).is_err());
}

#[test]
fn lenient_storage_forms_are_accepted_on_read() {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Gadget>().unwrap();
    let gadget = Gadget::new("x");
    let row = gadget_row(&registry, &gadget);

    let blob_uuid = replace(
        &row,
        "serial",
        SqliteValue::Blob(gadget.serial.as_bytes().to_vec()),
    );
    assert_eq!(to_entity::<Gadget>(&schema, &blob_uuid).unwrap().serial, gadget.serial);

    let iso_timestamp = replace(
        &row,
        "checked_at",
        SqliteValue::Text("2024-06-01T08:30:00".to_string()),
    );
    let decoded = to_entity::<Gadget>(&schema, &iso_timestamp).unwrap();
    assert_eq!(
        decoded.checked_at,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 30, 0)
    );

    let integer_weight = replace(&row, "weight", SqliteValue::Integer(3));
    assert_eq!(to_entity::<Gadget>(&schema, &integer_weight).unwrap().weight, 3.0);
}

#[test]
fn encoding_checks_fields_against_columns() {
    let registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Raw>().unwrap();

    let missing = Raw(Record::new().with("id", 1_i64).with("name", "a"));
    assert_eq!(
        to_row(&schema, &missing).unwrap_err(),
        MappingError::MissingField {
            field: "score".to_string(),
        }
    );

    let wrong_type = Raw(
        Record::new()
            .with("id", 1_i64)
            .with("name", 5_i64)
            .with("score", Value::Null),
    );
    assert!(matches!(
        to_row(&schema, &wrong_type).unwrap_err(),
        MappingError::ColumnType { expected: SqlType::Text, .. }
    ));

    let null_name = Raw(
        Record::new()
            .with("id", 1_i64)
            .with("name", Value::Null)
            .with("score", Value::Null),
    );
    assert!(matches!(
        to_row(&schema, &null_name).unwrap_err(),
        MappingError::UnexpectedNull { .. }
    ));

    let widened = Raw(
        Record::new()
            .with("id", Value::Null)
            .with("name", "a")
            .with("score", 4_i64),
    );
    assert_eq!(
        to_row(&schema, &widened).unwrap(),
        vec![Value::Null, Value::from("a"), Value::Real(4.0)]
    );
}
