//! Attribute table field descriptors and their SQL-like classification
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared dBase field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// `L`
    Boolean,
    /// `C`
    Char,
    /// `N` or `F`
    Number,
    /// `D`
    Date,
    /// Anything else (memo, binary, ...), keeps the raw code
    Other(char),
}

impl FieldType {
    pub fn from_code(code: u8) -> Self {
        match code.to_ascii_uppercase() {
            b'L' => FieldType::Boolean,
            b'C' => FieldType::Char,
            b'N' | b'F' => FieldType::Number,
            b'D' => FieldType::Date,
            other => FieldType::Other(other as char),
        }
    }

    pub fn code(&self) -> char {
        match self {
            FieldType::Boolean => 'L',
            FieldType::Char => 'C',
            FieldType::Number => 'N',
            FieldType::Date => 'D',
            FieldType::Other(c) => *c,
        }
    }
}

/// One column of the attribute table as declared in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    /// Declared width in characters
    pub length: u8,
    /// Digits after the decimal point
    pub decimals: u8,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType, length: u8, decimals: u8) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimals,
        }
    }

    /// Classify the field the way the result set reports it
    pub fn column_type(&self) -> ColumnType {
        match self.field_type {
            FieldType::Boolean => ColumnType::Boolean,
            FieldType::Char => ColumnType::Char,
            FieldType::Number if self.decimals > 0 => ColumnType::Double,
            FieldType::Number => ColumnType::Integer,
            FieldType::Date => ColumnType::Date,
            FieldType::Other(_) => ColumnType::Other,
        }
    }
}

/// SQL-like column type reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    Char,
    Integer,
    Double,
    Date,
    Other,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Double)
    }

    /// Name of the value type a non-null cell of this column holds
    pub fn class_name(&self) -> Option<&'static str> {
        match self {
            ColumnType::Boolean => Some("Boolean"),
            ColumnType::Char => Some("String"),
            ColumnType::Integer => Some("Long"),
            ColumnType::Double => Some("Double"),
            ColumnType::Date => Some("Date"),
            ColumnType::Other => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Char => "CHAR",
            ColumnType::Integer => "INTEGER",
            ColumnType::Double => "DOUBLE",
            ColumnType::Date => "DATE",
            ColumnType::Other => "OTHER",
        };
        f.write_str(name)
    }
}
