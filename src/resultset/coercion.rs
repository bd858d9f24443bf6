//! Attribute value coercion for the typed getters

use crate::types::{ColumnType, Value};
use crate::{Result, ShapeError};

fn mismatch(column: &str, target: &'static str, found: &str) -> ShapeError {
    ShapeError::TypeConversion {
        column: column.to_string(),
        target,
        found: found.to_string(),
    }
}

/// What a null cell of `column_type` is described as in errors
fn null_found(column_type: ColumnType) -> &'static str {
    column_type.class_name().unwrap_or("null")
}

/// Nearest integer, halves rounding toward positive infinity
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub(crate) fn to_string(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn to_long(column: &str, column_type: ColumnType, value: &Value) -> Result<i64> {
    match value {
        Value::Integer(v) => Ok(*v),
        Value::Float(v) => Ok(round_half_up(*v)),
        Value::Null if column_type.is_numeric() => Ok(0),
        Value::Null => Err(mismatch(column, "Long", null_found(column_type))),
        other => Err(mismatch(column, "Long", other.type_name())),
    }
}

pub(crate) fn to_double(column: &str, column_type: ColumnType, value: &Value) -> Result<f64> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        Value::Null if column_type.is_numeric() => Ok(0.0),
        Value::Null => Err(mismatch(column, "Double", null_found(column_type))),
        other => Err(mismatch(column, "Double", other.type_name())),
    }
}

pub(crate) fn to_boolean(column: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(v) => Ok(*v),
        other => Err(mismatch(column, "Boolean", other.type_name())),
    }
}

/// Raw value, or the column type's default for a null cell
pub(crate) fn to_object(column: &str, column_type: ColumnType, value: &Value) -> Result<Value> {
    if !value.is_null() {
        return Ok(value.clone());
    }
    match column_type {
        ColumnType::Integer => Ok(Value::Integer(0)),
        ColumnType::Double => Ok(Value::Float(0.0)),
        ColumnType::Char => Ok(Value::Text(String::new())),
        ColumnType::Boolean => Ok(Value::Bool(false)),
        ColumnType::Date | ColumnType::Other => Err(ShapeError::NullConversion(column.to_string())),
    }
}
