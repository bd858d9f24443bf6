//! Random-access dBase III attribute table (`.dbf`)
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (32 bytes)                      │
//! │  - version, last update (YMD)          │
//! │  - record count (u32 LE)               │
//! │  - header length, record length (u16)  │
//! ├────────────────────────────────────────┤
//! │ Field descriptors (32 bytes each)      │
//! │  - name[11], type, length, decimals    │
//! │ 0x0D terminator                        │
//! ├────────────────────────────────────────┤
//! │ Records (fixed width)                  │
//! │  - deletion flag (' ' or '*')          │
//! │  - field bytes, ASCII, space padded    │
//! └────────────────────────────────────────┘
//! ```

use super::FileBytes;
use crate::types::{AttributeRow, FieldDescriptor, FieldType, Value};
use crate::{Result, ShapeError};
use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDate;
use std::path::Path;

const HEADER_SIZE: usize = 32;
const FIELD_DESCRIPTOR_SIZE: usize = 32;
const FIELD_TERMINATOR: u8 = 0x0D;
const DELETED_FLAG: u8 = b'*';

pub struct DBaseFile {
    bytes: FileBytes,
    fields: Vec<FieldDescriptor>,
    /// Byte offset of each field inside a record, past the deletion flag
    field_offsets: Vec<usize>,
    num_records: usize,
    header_len: usize,
    record_len: usize,
    trim_text: bool,
}

impl DBaseFile {
    /// Open a `.dbf` file
    pub fn open(path: &Path, use_mmap: bool, trim_text: bool) -> Result<Self> {
        let bytes = FileBytes::open(path, use_mmap)?;
        Self::parse(bytes, trim_text)
    }

    /// Parse a table already held in memory
    pub fn from_bytes(bytes: Vec<u8>, trim_text: bool) -> Result<Self> {
        Self::parse(FileBytes::Loaded(bytes), trim_text)
    }

    fn parse(bytes: FileBytes, trim_text: bool) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ShapeError::InvalidData(format!(
                "dBase header truncated: {} bytes",
                bytes.len()
            )));
        }
        let num_records = LittleEndian::read_u32(&bytes[4..8]) as usize;
        let header_len = LittleEndian::read_u16(&bytes[8..10]) as usize;
        let record_len = LittleEndian::read_u16(&bytes[10..12]) as usize;

        let mut fields = Vec::new();
        let mut field_offsets = Vec::new();
        let mut pos = HEADER_SIZE;
        // First record byte is the deletion flag
        let mut offset = 1;
        loop {
            match bytes.get(pos) {
                Some(&FIELD_TERMINATOR) => break,
                Some(_) if pos + FIELD_DESCRIPTOR_SIZE <= header_len.min(bytes.len()) => {}
                _ => {
                    return Err(ShapeError::InvalidData(
                        "dBase field descriptors are not terminated".into(),
                    ))
                }
            }
            let raw = &bytes[pos..pos + FIELD_DESCRIPTOR_SIZE];
            let name_end = raw[..11].iter().position(|&b| b == 0).unwrap_or(11);
            let name = String::from_utf8_lossy(&raw[..name_end]).trim().to_string();
            let field = FieldDescriptor::new(name, FieldType::from_code(raw[11]), raw[16], raw[17]);

            field_offsets.push(offset);
            offset += field.length as usize;
            fields.push(field);
            pos += FIELD_DESCRIPTOR_SIZE;
        }

        if offset > record_len {
            return Err(ShapeError::InvalidData(format!(
                "dBase fields span {} bytes but records are {} bytes",
                offset, record_len
            )));
        }
        let required = header_len + num_records * record_len;
        if bytes.len() < required {
            return Err(ShapeError::Corruption(format!(
                "dBase table truncated: {} records need {} bytes, file has {}",
                num_records,
                required,
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            fields,
            field_offsets,
            num_records,
            header_len,
            record_len,
            trim_text,
        })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    fn record_bytes(&self, record_number: usize) -> Result<&[u8]> {
        if record_number < 1 || record_number > self.num_records {
            return Err(ShapeError::InvalidArgument(format!(
                "dBase record {} out of range 1..={}",
                record_number, self.num_records
            )));
        }
        let start = self.header_len + (record_number - 1) * self.record_len;
        Ok(&self.bytes[start..start + self.record_len])
    }

    /// Whether the record carries the deletion flag
    pub fn is_deleted(&self, record_number: usize) -> Result<bool> {
        Ok(self.record_bytes(record_number)?[0] == DELETED_FLAG)
    }

    /// Decode the attribute row of a 1-based record number
    pub fn read_record(&self, record_number: usize) -> Result<AttributeRow> {
        let record = self.record_bytes(record_number)?;
        let mut row = AttributeRow::with_capacity(self.fields.len());
        for (field, &offset) in self.fields.iter().zip(&self.field_offsets) {
            let raw = &record[offset..offset + field.length as usize];
            row.insert(field.name.clone(), decode_value(field, raw, self.trim_text));
        }
        Ok(row)
    }
}

fn decode_value(field: &FieldDescriptor, raw: &[u8], trim_text: bool) -> Value {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if trimmed.is_empty() {
        return Value::Null;
    }
    match field.field_type {
        FieldType::Char | FieldType::Other(_) => {
            if trim_text {
                Value::Text(trimmed.to_string())
            } else {
                Value::Text(text.trim_end_matches('\0').to_string())
            }
        }
        FieldType::Number => decode_number(field, trimmed),
        FieldType::Date => match NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            Ok(date) => Value::Date(date),
            Err(_) => {
                tracing::debug!("Unparseable date '{}' in field {}", trimmed, field.name);
                Value::Null
            }
        },
        FieldType::Boolean => match trimmed.as_bytes()[0] {
            b'T' | b't' | b'Y' | b'y' => Value::Bool(true),
            b'F' | b'f' | b'N' | b'n' => Value::Bool(false),
            _ => Value::Null,
        },
    }
}

fn decode_number(field: &FieldDescriptor, text: &str) -> Value {
    if field.decimals == 0 {
        if let Ok(v) = text.parse::<i64>() {
            return Value::Integer(v);
        }
    }
    match text.parse::<f64>() {
        Ok(v) => Value::Float(v),
        Err(_) => {
            // Overflowed numeric fields are written as asterisks
            tracing::debug!("Unparseable number '{}' in field {}", text, field.name);
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::DbfBuilder;

    fn sample_table() -> DBaseFile {
        let bytes = DbfBuilder::new()
            .field("NAME", b'C', 10, 0)
            .field("POP", b'N', 8, 0)
            .field("AREA", b'N', 10, 2)
            .field("WET", b'L', 1, 0)
            .field("SURVEYED", b'D', 8, 0)
            .record(&["Klamath", "1200", "35.25", "T", "20130704"])
            .record(&["", "", "", "?", ""])
            .deleted_record(&["Gone", "7", "1.5", "F", "bogus"])
            .build();
        DBaseFile::from_bytes(bytes, true).unwrap()
    }

    #[test]
    fn test_field_descriptors() {
        let table = sample_table();
        let names: Vec<&str> = table.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["NAME", "POP", "AREA", "WET", "SURVEYED"]);
        assert_eq!(table.fields()[2].decimals, 2);
        assert_eq!(table.fields()[2].length, 10);
        assert_eq!(table.num_records(), 3);
    }

    #[test]
    fn test_decode_values() {
        let table = sample_table();
        let row = table.read_record(1).unwrap();
        assert_eq!(row.get("name"), Some(&Value::Text("Klamath".into())));
        assert_eq!(row.get("POP"), Some(&Value::Integer(1200)));
        assert_eq!(row.get("AREA"), Some(&Value::Float(35.25)));
        assert_eq!(row.get("WET"), Some(&Value::Bool(true)));
        assert_eq!(
            row.get("SURVEYED"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2013, 7, 4).unwrap()))
        );
    }

    #[test]
    fn test_blank_values_are_null() {
        let table = sample_table();
        let row = table.read_record(2).unwrap();
        for (name, value) in row.iter() {
            assert_eq!(value, &Value::Null, "field {}", name);
        }
    }

    #[test]
    fn test_deleted_and_bad_date() {
        let table = sample_table();
        assert!(table.is_deleted(3).unwrap());
        assert!(!table.is_deleted(1).unwrap());
        let row = table.read_record(3).unwrap();
        assert_eq!(row.get("SURVEYED"), Some(&Value::Null));
        assert_eq!(row.get("WET"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_record_out_of_range() {
        let table = sample_table();
        assert!(table.read_record(0).is_err());
        assert!(table.read_record(4).is_err());
    }

    #[test]
    fn test_truncated_table() {
        let mut bytes = DbfBuilder::new()
            .field("NAME", b'C', 10, 0)
            .record(&["a"])
            .record(&["b"])
            .build();
        bytes.truncate(bytes.len() - 5);
        assert!(matches!(
            DBaseFile::from_bytes(bytes, true),
            Err(ShapeError::Corruption(_))
        ));
        assert!(DBaseFile::from_bytes(vec![0u8; 10], true).is_err());
    }
}
