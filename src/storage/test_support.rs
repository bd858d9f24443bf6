//! Writers for small `.shp`/`.shx`/`.dbf` fixtures used by tests

use super::shape_type;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io;
use std::path::Path;

/// Builds dBase III table bytes
pub(crate) struct DbfBuilder {
    fields: Vec<(String, u8, u8, u8)>,
    records: Vec<(bool, Vec<String>)>,
}

impl DbfBuilder {
    pub(crate) fn new() -> Self {
        Self {
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    pub(crate) fn field(mut self, name: &str, code: u8, length: u8, decimals: u8) -> Self {
        self.fields.push((name.to_string(), code, length, decimals));
        self
    }

    pub(crate) fn record(mut self, values: &[&str]) -> Self {
        self.records.push((false, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn deleted_record(mut self, values: &[&str]) -> Self {
        self.records.push((true, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let header_len = 32 + self.fields.len() * 32 + 1;
        let record_len = 1 + self.fields.iter().map(|f| f.2 as usize).sum::<usize>();

        let mut out = Vec::new();
        out.push(0x03);
        out.extend_from_slice(&[113, 7, 4]);
        out.write_u32::<LittleEndian>(self.records.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(header_len as u16).unwrap();
        out.write_u16::<LittleEndian>(record_len as u16).unwrap();
        out.extend_from_slice(&[0u8; 20]);

        for (name, code, length, decimals) in &self.fields {
            let mut descriptor = [0u8; 32];
            descriptor[..name.len()].copy_from_slice(name.as_bytes());
            descriptor[11] = *code;
            descriptor[16] = *length;
            descriptor[17] = *decimals;
            out.extend_from_slice(&descriptor);
        }
        out.push(0x0D);

        for (deleted, values) in &self.records {
            out.push(if *deleted { b'*' } else { b' ' });
            for (i, (_, code, length, _)) in self.fields.iter().enumerate() {
                let value = values.get(i).map(String::as_str).unwrap_or("");
                let width = *length as usize;
                // Numbers are right aligned, everything else left aligned
                let cell = if *code == b'N' || *code == b'F' {
                    format!("{:>width$}", value, width = width)
                } else {
                    format!("{:<width$}", value, width = width)
                };
                out.extend_from_slice(&cell.as_bytes()[..width]);
            }
        }
        out.push(0x1A);
        out
    }
}

/// Geometry of one fixture record, coordinates as `(x, y)`
pub(crate) enum TestShape {
    Null,
    Point(f64, f64),
    PointZ(f64, f64, f64),
    MultiPoint(Vec<(f64, f64)>),
    Polyline(Vec<Vec<(f64, f64)>>),
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl TestShape {
    fn vertices(&self) -> Vec<(f64, f64)> {
        match self {
            TestShape::Null => Vec::new(),
            TestShape::Point(x, y) | TestShape::PointZ(x, y, _) => vec![(*x, *y)],
            TestShape::MultiPoint(points) => points.clone(),
            TestShape::Polyline(parts) | TestShape::Polygon(parts) => parts.concat(),
        }
    }
}

fn extent(points: &[(f64, f64)]) -> [f64; 4] {
    let mut ext = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
    for &(x, y) in points {
        ext[0] = ext[0].min(x);
        ext[1] = ext[1].min(y);
        ext[2] = ext[2].max(x);
        ext[3] = ext[3].max(y);
    }
    ext
}

/// Writes a shapefile triple to disk
pub(crate) struct ShapefileWriter {
    shape_type: i32,
    dbf: DbfBuilder,
    has_fields: bool,
    shapes: Vec<TestShape>,
}

impl ShapefileWriter {
    pub(crate) fn new(shape_type: i32) -> Self {
        Self {
            shape_type,
            dbf: DbfBuilder::new(),
            has_fields: false,
            shapes: Vec::new(),
        }
    }

    pub(crate) fn field(&mut self, name: &str, code: u8, length: u8, decimals: u8) {
        let dbf = std::mem::replace(&mut self.dbf, DbfBuilder::new());
        self.dbf = dbf.field(name, code, length, decimals);
        self.has_fields = true;
    }

    pub(crate) fn add(&mut self, shape: TestShape, values: &[&str]) {
        let dbf = std::mem::replace(&mut self.dbf, DbfBuilder::new());
        self.dbf = dbf.record(values);
        self.shapes.push(shape);
    }

    /// Like [`add`](Self::add) with the attribute row flagged deleted
    pub(crate) fn add_deleted(&mut self, shape: TestShape, values: &[&str]) {
        let dbf = std::mem::replace(&mut self.dbf, DbfBuilder::new());
        self.dbf = dbf.deleted_record(values);
        self.shapes.push(shape);
    }

    fn content(shape: &TestShape) -> Vec<u8> {
        let mut out = Vec::new();
        match shape {
            TestShape::Null => out.write_i32::<LittleEndian>(shape_type::NULL).unwrap(),
            TestShape::Point(x, y) => {
                out.write_i32::<LittleEndian>(shape_type::POINT).unwrap();
                out.write_f64::<LittleEndian>(*x).unwrap();
                out.write_f64::<LittleEndian>(*y).unwrap();
            }
            TestShape::PointZ(x, y, z) => {
                out.write_i32::<LittleEndian>(shape_type::POINT_Z).unwrap();
                out.write_f64::<LittleEndian>(*x).unwrap();
                out.write_f64::<LittleEndian>(*y).unwrap();
                out.write_f64::<LittleEndian>(*z).unwrap();
                out.write_f64::<LittleEndian>(0.0).unwrap();
            }
            TestShape::MultiPoint(points) => {
                out.write_i32::<LittleEndian>(shape_type::MULTI_POINT).unwrap();
                for v in extent(points) {
                    out.write_f64::<LittleEndian>(v).unwrap();
                }
                out.write_i32::<LittleEndian>(points.len() as i32).unwrap();
                for &(x, y) in points {
                    out.write_f64::<LittleEndian>(x).unwrap();
                    out.write_f64::<LittleEndian>(y).unwrap();
                }
            }
            TestShape::Polyline(parts) | TestShape::Polygon(parts) => {
                let code = if matches!(shape, TestShape::Polygon(_)) {
                    shape_type::POLYGON
                } else {
                    shape_type::POLYLINE
                };
                let points = shape.vertices();
                out.write_i32::<LittleEndian>(code).unwrap();
                for v in extent(&points) {
                    out.write_f64::<LittleEndian>(v).unwrap();
                }
                out.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
                out.write_i32::<LittleEndian>(points.len() as i32).unwrap();
                let mut start = 0;
                for part in parts {
                    out.write_i32::<LittleEndian>(start).unwrap();
                    start += part.len() as i32;
                }
                for (x, y) in points {
                    out.write_f64::<LittleEndian>(x).unwrap();
                    out.write_f64::<LittleEndian>(y).unwrap();
                }
            }
        }
        out
    }

    fn header(&self, file_len: usize, ext: [f64; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(100);
        out.write_i32::<BigEndian>(9994).unwrap();
        out.extend_from_slice(&[0u8; 20]);
        out.write_i32::<BigEndian>((file_len / 2) as i32).unwrap();
        out.write_i32::<LittleEndian>(1000).unwrap();
        out.write_i32::<LittleEndian>(self.shape_type).unwrap();
        for v in ext {
            out.write_f64::<LittleEndian>(v).unwrap();
        }
        out.extend_from_slice(&[0u8; 32]);
        out
    }

    /// Write `.shp`, optionally `.shx`, and `.dbf` when fields were declared
    pub(crate) fn write(self, shp_path: &Path, with_index: bool) -> io::Result<()> {
        let all_points: Vec<(f64, f64)> = self.shapes.iter().flat_map(|s| s.vertices()).collect();
        let ext = if all_points.is_empty() { [0.0; 4] } else { extent(&all_points) };

        let mut body = Vec::new();
        let mut index = Vec::new();
        for (i, shape) in self.shapes.iter().enumerate() {
            let content = Self::content(shape);
            let offset = 100 + body.len();
            index.write_i32::<BigEndian>((offset / 2) as i32).unwrap();
            index.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
            body.write_i32::<BigEndian>(i as i32 + 1).unwrap();
            body.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
            body.extend_from_slice(&content);
        }

        let mut shp = self.header(100 + body.len(), ext);
        shp.extend_from_slice(&body);
        std::fs::write(shp_path, shp)?;

        if with_index {
            let mut shx = self.header(100 + index.len(), ext);
            shx.extend_from_slice(&index);
            std::fs::write(shp_path.with_extension("shx"), shx)?;
        }
        if self.has_fields {
            std::fs::write(shp_path.with_extension("dbf"), self.dbf.build())?;
        }
        Ok(())
    }
}
