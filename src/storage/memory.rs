//! In-memory shape source
//!
//! Holds fully decoded records and honors the same seek-then-read contract
//! as the file-backed reader. Useful for tests, benches and callers that
//! assemble features themselves.

use super::{shape_type, RawRecord, RawShape, ShapeSource};
use crate::types::{AttributeRow, FieldDescriptor};
use crate::Result;

pub struct MemoryShapeSource {
    name: String,
    shape_type: i32,
    fields: Vec<FieldDescriptor>,
    records: Vec<(RawShape, AttributeRow)>,
    /// 0-based index of the record the next read returns
    next: usize,
    bounds: Option<[f64; 4]>,
    reads: usize,
}

impl MemoryShapeSource {
    pub fn new(name: impl Into<String>, shape_type: i32, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            shape_type,
            fields,
            records: Vec::new(),
            next: 0,
            bounds: None,
            reads: 0,
        }
    }

    /// Append a record; returns its 1-based record number
    pub fn push(&mut self, shape: RawShape, attributes: AttributeRow) -> usize {
        if let Some(rect) = shape_rectangle(&shape) {
            self.bounds = Some(match self.bounds {
                None => rect,
                Some(b) => [
                    b[0].min(rect[0]),
                    b[1].max(rect[1]),
                    b[2].min(rect[2]),
                    b[3].max(rect[3]),
                ],
            });
        }
        self.records.push((shape, attributes));
        self.records.len()
    }

    pub fn with_record(mut self, shape: RawShape, attributes: AttributeRow) -> Self {
        self.push(shape, attributes);
        self
    }

    /// Number of records decoded through [`ShapeSource::read_next`] so far
    pub fn reads(&self) -> usize {
        self.reads
    }
}

fn shape_rectangle(shape: &RawShape) -> Option<[f64; 4]> {
    if let Some(rect) = shape.bounding_rectangle {
        return Some(rect);
    }
    if shape.shape_type == shape_type::NULL {
        return None;
    }
    let first = shape.parts.first()?;
    match first.coords.as_slice() {
        [x, y, ..] => Some([*y, *y, *x, *x]),
        _ => None,
    }
}

impl ShapeSource for MemoryShapeSource {
    fn seek_before(&mut self, record_number: usize) -> Result<bool> {
        if record_number < 1 || record_number > self.records.len() {
            return Ok(false);
        }
        self.next = record_number - 1;
        Ok(true)
    }

    fn read_next(&mut self) -> Result<Option<RawRecord>> {
        let Some((shape, attributes)) = self.records.get(self.next) else {
            return Ok(None);
        };
        let record = RawRecord {
            record_number: self.next + 1,
            shape: shape.clone(),
            attributes: attributes.clone(),
        };
        self.next += 1;
        self.reads += 1;
        Ok(Some(record))
    }

    fn total_record_count(&self) -> usize {
        self.records.len()
    }

    fn overall_bounds(&self) -> [f64; 4] {
        self.bounds.unwrap_or([0.0; 4])
    }

    fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn dataset_name(&self) -> &str {
        &self.name
    }

    fn shape_type_name(&self) -> &str {
        shape_type::name(self.shape_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PartBuffer;

    #[test]
    fn test_seek_then_read() {
        let mut source = MemoryShapeSource::new("pts", shape_type::POINT, Vec::new())
            .with_record(RawShape::point(0.0, 1.0), AttributeRow::new())
            .with_record(RawShape::point(0.0, 2.0), AttributeRow::new())
            .with_record(RawShape::point(0.0, 3.0), AttributeRow::new());

        assert!(source.seek_before(2).unwrap());
        assert_eq!(source.read_next().unwrap().unwrap().record_number, 2);
        assert_eq!(source.read_next().unwrap().unwrap().record_number, 3);
        assert!(source.read_next().unwrap().is_none());

        assert!(!source.seek_before(0).unwrap());
        assert!(!source.seek_before(4).unwrap());
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn test_overall_bounds() {
        let mut source = MemoryShapeSource::new("mixed", shape_type::POLYLINE, Vec::new());
        assert_eq!(source.overall_bounds(), [0.0; 4]);

        source.push(RawShape::null(), AttributeRow::new());
        source.push(RawShape::point(-5.0, 10.0), AttributeRow::new());
        let line = PartBuffer::from_xy(&[(5.0, 12.0), (1.0, 20.0)]);
        source.push(
            RawShape::with_parts(shape_type::POLYLINE, vec![line]),
            AttributeRow::new(),
        );
        assert_eq!(source.overall_bounds(), [10.0, 20.0, -5.0, 5.0]);
        assert_eq!(source.shape_type_name(), "PolyLine");
    }
}
