//! Field-name keyed values exchanged between entities and the row mapper.

use crate::mapper::{MapResult, MappingError};
use crate::model::value::{FromValue, Value};

/// Ordered bag of `(field name, value)` pairs for one entity instance.
///
/// Field order follows insertion; lookups are by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style [`Record::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets `field`, replacing any previous value for it.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Extracts `field` as `T`.
    ///
    /// # Errors
    /// - `MissingField` when the record has no such field.
    /// - `FieldType` when the stored value is not convertible to `T`.
    pub fn get<T: FromValue>(&self, field: &str) -> MapResult<T> {
        let value = self.value(field).ok_or_else(|| MappingError::MissingField {
            field: field.to_string(),
        })?;
        T::from_value(value).ok_or_else(|| MappingError::FieldType {
            field: field.to_string(),
            expected: T::EXPECTED,
            found: value.kind_name(),
        })
    }

    /// Like [`Record::get`] but yields `None` when the field is absent.
    pub fn get_opt<T: FromValue>(&self, field: &str) -> MapResult<Option<T>> {
        if self.value(field).is_none() {
            return Ok(None);
        }
        self.get(field).map(Some)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::mapper::MappingError;
    use crate::model::value::Value;

    #[test]
    fn set_replaces_existing_field_in_place() {
        let mut record = Record::new().with("id", 0_i64).with("name", "Ana");
        record.set("id", 9_i64);

        assert_eq!(record.len(), 2);
        assert_eq!(record.value("id"), Some(&Value::Integer(9)));
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn get_reports_missing_and_mistyped_fields() {
        let record = Record::new().with("age", "thirty");

        let missing = record.get::<String>("name").unwrap_err();
        assert_eq!(
            missing,
            MappingError::MissingField {
                field: "name".to_string()
            }
        );

        let mistyped = record.get::<i64>("age").unwrap_err();
        assert!(matches!(
            mistyped,
            MappingError::FieldType {
                expected: "integer",
                found: "text",
                ..
            }
        ));
    }

    #[test]
    fn get_opt_tolerates_absent_fields() {
        let record = Record::new().with("nickname", Option::<String>::None);
        assert_eq!(record.get_opt::<String>("missing").unwrap(), None);
        assert_eq!(record.get::<Option<String>>("nickname").unwrap(), None);
    }
}
