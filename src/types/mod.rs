//! Value types shared by the storage, catalog and cursor layers

mod spatial;
mod table;

pub use spatial::{BoundingBox, GeoCoord};
pub use table::{ColumnType, FieldDescriptor, FieldType};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One attribute cell as stored in the attribute table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// Integral number
    Integer(i64),

    /// Floating point number
    Float(f64),

    /// Logical value
    Bool(bool),

    /// Character data
    Text(String),

    /// Calendar date
    Date(NaiveDate),

    /// Blank cell
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the native type, used in conversion errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Long",
            Value::Float(_) => "Double",
            Value::Bool(_) => "Boolean",
            Value::Text(_) => "String",
            Value::Date(_) => "Date",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole numbers
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

/// Attribute values of one record, keyed by declared column name.
///
/// Lookup ignores ASCII case and scans linearly; dBase caps a table at 255
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    entries: Vec<(String, Value)>,
}

impl AttributeRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set a column's value, replacing any value stored under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.position(&name) {
            Some(pos) => self.entries[pos].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// `None` when the row has no such column; `Some(Value::Null)` for a blank cell.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|pos| &self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AttributeRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = AttributeRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}
