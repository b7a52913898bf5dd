//! Store-level document representation.
//!
//! Documents are what the `DocumentStore` hands back: an id plus a map of
//! typed field values. Records in [`crate::types`] are built from these once
//! at ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field map of a document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single typed value inside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    /// The backend's native timestamp type.
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    /// Returns the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a numeric view of the value.
    ///
    /// Numeric strings are accepted since hand-entered documents often
    /// store amounts as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// A document read from a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Field values.
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    /// Creates an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }

    /// Sets a field, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Gets a raw field value. `Null` is reported as absent.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Gets the first present field among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&FieldValue> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Gets a string field. Numbers are rendered as text.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Double(d) => Some(d.to_string()),
            _ => None,
        }
    }

    /// Gets the first string field among `keys`.
    pub fn first_string(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get_string(k))
    }

    /// Gets a numeric field.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_absent() {
        let doc = Document::new("d1").with("a", FieldValue::Null).with("b", "x");
        assert!(doc.get("a").is_none());
        assert_eq!(doc.first_string(&["a", "b"]), Some("x".to_string()));
    }

    #[test]
    fn test_numeric_strings() {
        let doc = Document::new("d1").with("amount", "1500").with("bad", "abc");
        assert_eq!(doc.get_f64("amount"), Some(1500.0));
        assert_eq!(doc.get_f64("bad"), None);
    }
}
