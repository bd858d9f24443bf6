//! Random-access shapefile reader
//!
//! ```text
//! .shp  ┌──────────────────────────────────────┐
//!       │ Header (100 bytes)                   │
//!       │  - file code 9994, length  (BE)      │
//!       │  - version, shape type     (LE)      │
//!       │  - xmin ymin xmax ymax z/m (LE f64)  │
//!       ├──────────────────────────────────────┤
//!       │ Record header: number, length (BE)   │
//!       │ Record content: shape type + geometry│
//!       │ ...                                  │
//!       └──────────────────────────────────────┘
//! .shx  100-byte header, then (offset, length) BE pairs in 16-bit words
//! .dbf  attribute table, one row per record (see `dbase`)
//! ```
//!
//! The `.shx` index gives O(1) seeks; when it is absent the index is rebuilt
//! by walking the record headers once at open time.

use super::dbase::DBaseFile;
use super::{shape_type, FileBytes, PartBuffer, RawRecord, RawShape, ShapeSource};
use crate::config::ReaderConfig;
use crate::types::{AttributeRow, FieldDescriptor};
use crate::{Result, ShapeError};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::path::{Path, PathBuf};

const FILE_CODE: i32 = 9994;
const HEADER_SIZE: usize = 100;
const RECORD_HEADER_SIZE: usize = 8;
const INDEX_ENTRY_SIZE: usize = 8;

/// Location of one record inside the `.shp` file
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Byte offset of the record header
    offset: usize,
    /// Content length in bytes, excluding the record header
    content_len: usize,
}

pub struct MappedShapefile {
    name: String,
    path: PathBuf,
    shp: FileBytes,
    index: Vec<IndexEntry>,
    attributes: Option<DBaseFile>,
    shape_type: i32,
    /// `[yMin, yMax, xMin, xMax]`
    bounds: [f64; 4],
    /// 0-based index of the record the next read decodes
    next: usize,
}

impl MappedShapefile {
    /// Open with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    /// Open a `.shp` file (the extension may be omitted) and its siblings
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let shp_path = sibling(path, "shp");
        let shx_path = sibling(path, "shx");
        let dbf_path = sibling(path, "dbf");

        let shp = FileBytes::open(&shp_path, config.use_mmap)?;
        let (shape_type, bounds) = parse_header(&shp)?;

        let index = if shx_path.exists() {
            let shx = FileBytes::open(&shx_path, config.use_mmap)?;
            read_index(&shx, shp.len())?
        } else {
            tracing::warn!(
                "No index file for {}, rebuilding from record headers",
                shp_path.display()
            );
            rebuild_index(&shp)?
        };

        let attributes = if dbf_path.exists() {
            let table = DBaseFile::open(&dbf_path, config.use_mmap, config.trim_text)?;
            if table.num_records() != index.len() {
                tracing::warn!(
                    "{} has {} attribute rows for {} shapes",
                    dbf_path.display(),
                    table.num_records(),
                    index.len()
                );
            }
            Some(table)
        } else if config.require_attributes {
            return Err(ShapeError::FileNotFound(dbf_path));
        } else {
            None
        };

        let name = shp_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            "Opened {} ({}, {} records, {} fields)",
            shp_path.display(),
            shape_type::name(shape_type),
            index.len(),
            attributes.as_ref().map_or(0, |t| t.fields().len())
        );

        Ok(Self {
            name,
            path: shp_path,
            shp,
            index,
            attributes,
            shape_type,
            bounds,
            next: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shape type code declared in the file header
    pub fn shape_type(&self) -> i32 {
        self.shape_type
    }

    pub fn attribute_table(&self) -> Option<&DBaseFile> {
        self.attributes.as_ref()
    }

    /// Record number the next read returns, `None` at end of file
    pub fn current_record_number(&self) -> Option<usize> {
        (self.next < self.index.len()).then_some(self.next + 1)
    }

    fn read_attributes(&self, position: usize) -> Result<AttributeRow> {
        match &self.attributes {
            Some(table) if position <= table.num_records() => {
                if table.is_deleted(position)? {
                    tracing::debug!(record = position, "attribute row is flagged deleted");
                }
                table.read_record(position)
            }
            _ => Ok(AttributeRow::new()),
        }
    }
}

impl ShapeSource for MappedShapefile {
    fn seek_before(&mut self, record_number: usize) -> Result<bool> {
        if record_number < 1 || record_number > self.index.len() {
            return Ok(false);
        }
        self.next = record_number - 1;
        Ok(true)
    }

    fn read_next(&mut self) -> Result<Option<RawRecord>> {
        let Some(entry) = self.index.get(self.next).copied() else {
            return Ok(None);
        };
        let position = self.next + 1;

        let header = &self.shp[entry.offset..entry.offset + RECORD_HEADER_SIZE];
        let record_number = BigEndian::read_i32(&header[0..4]);
        let record_number = usize::try_from(record_number).map_err(|_| {
            ShapeError::Corruption(format!(
                "Negative record number {} at entry {}",
                record_number, position
            ))
        })?;
        let start = entry.offset + RECORD_HEADER_SIZE;
        let content = &self.shp[start..start + entry.content_len];
        let shape = decode_shape(content, record_number)?;
        let attributes = self.read_attributes(position)?;

        self.next += 1;
        Ok(Some(RawRecord {
            record_number,
            shape,
            attributes,
        }))
    }

    fn total_record_count(&self) -> usize {
        self.index.len()
    }

    fn overall_bounds(&self) -> [f64; 4] {
        self.bounds
    }

    fn field_descriptors(&self) -> &[FieldDescriptor] {
        match &self.attributes {
            Some(table) => table.fields(),
            None => &[],
        }
    }

    fn dataset_name(&self) -> &str {
        &self.name
    }

    fn shape_type_name(&self) -> &str {
        shape_type::name(self.shape_type)
    }
}

/// Sibling file with the given extension, matching the case of the input's
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let upper = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| !e.is_empty() && e.chars().all(|c| c.is_ascii_uppercase()));
    if upper {
        path.with_extension(ext.to_ascii_uppercase())
    } else {
        path.with_extension(ext)
    }
}

fn parse_header(shp: &[u8]) -> Result<(i32, [f64; 4])> {
    if shp.len() < HEADER_SIZE {
        return Err(ShapeError::InvalidData(format!(
            "Shapefile header truncated: {} bytes",
            shp.len()
        )));
    }
    let file_code = BigEndian::read_i32(&shp[0..4]);
    if file_code != FILE_CODE {
        return Err(ShapeError::InvalidData(format!(
            "Not a shapefile: file code {} (expected {})",
            file_code, FILE_CODE
        )));
    }
    let shape_type = LittleEndian::read_i32(&shp[32..36]);
    let x_min = LittleEndian::read_f64(&shp[36..44]);
    let y_min = LittleEndian::read_f64(&shp[44..52]);
    let x_max = LittleEndian::read_f64(&shp[52..60]);
    let y_max = LittleEndian::read_f64(&shp[60..68]);
    Ok((shape_type, [y_min, y_max, x_min, x_max]))
}

fn read_index(shx: &[u8], shp_len: usize) -> Result<Vec<IndexEntry>> {
    if shx.len() < HEADER_SIZE {
        return Err(ShapeError::InvalidData(format!(
            "Index header truncated: {} bytes",
            shx.len()
        )));
    }
    let entries = &shx[HEADER_SIZE..];
    if entries.len() % INDEX_ENTRY_SIZE != 0 {
        tracing::warn!("Index has {} trailing bytes", entries.len() % INDEX_ENTRY_SIZE);
    }
    entries
        .chunks_exact(INDEX_ENTRY_SIZE)
        .enumerate()
        .map(|(i, raw)| {
            let offset = BigEndian::read_i32(&raw[0..4]).max(0) as usize * 2;
            let content_len = BigEndian::read_i32(&raw[4..8]).max(0) as usize * 2;
            let entry = IndexEntry { offset, content_len };
            check_entry(entry, i + 1, shp_len)?;
            Ok(entry)
        })
        .collect()
}

fn rebuild_index(shp: &[u8]) -> Result<Vec<IndexEntry>> {
    let mut index = Vec::new();
    let mut pos = HEADER_SIZE;
    while pos + RECORD_HEADER_SIZE <= shp.len() {
        let content_len = BigEndian::read_i32(&shp[pos + 4..pos + 8]).max(0) as usize * 2;
        let entry = IndexEntry {
            offset: pos,
            content_len,
        };
        check_entry(entry, index.len() + 1, shp.len())?;
        index.push(entry);
        pos += RECORD_HEADER_SIZE + content_len;
    }
    Ok(index)
}

fn check_entry(entry: IndexEntry, position: usize, shp_len: usize) -> Result<()> {
    let end = entry.offset + RECORD_HEADER_SIZE + entry.content_len;
    if entry.offset < HEADER_SIZE || end > shp_len {
        return Err(ShapeError::Corruption(format!(
            "Record {} spans bytes {}..{} outside the {}-byte shapefile",
            position, entry.offset, end, shp_len
        )));
    }
    Ok(())
}

/// Bounds-checked little-endian reads over one record's content
struct Content<'a> {
    buf: &'a [u8],
    record_number: usize,
}

impl<'a> Content<'a> {
    fn slice(&self, pos: usize, len: usize) -> Result<&'a [u8]> {
        self.buf.get(pos..pos + len).ok_or_else(|| {
            ShapeError::Corruption(format!(
                "Record {} truncated: needs {} bytes, has {}",
                self.record_number,
                pos + len,
                self.buf.len()
            ))
        })
    }

    fn i32_at(&self, pos: usize) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.slice(pos, 4)?))
    }

    fn count_at(&self, pos: usize) -> Result<usize> {
        let value = self.i32_at(pos)?;
        usize::try_from(value).map_err(|_| {
            ShapeError::Corruption(format!(
                "Record {} has negative count {}",
                self.record_number, value
            ))
        })
    }

    fn f64_at(&self, pos: usize) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.slice(pos, 8)?))
    }

    /// `xmin ymin xmax ymax` at `pos`, reordered to `[yMin, yMax, xMin, xMax]`
    fn rectangle_at(&self, pos: usize) -> Result<[f64; 4]> {
        let x_min = self.f64_at(pos)?;
        let y_min = self.f64_at(pos + 8)?;
        let x_max = self.f64_at(pos + 16)?;
        let y_max = self.f64_at(pos + 24)?;
        Ok([y_min, y_max, x_min, x_max])
    }

    /// Interleaved x/y pairs, plus z from a separate array when `z_pos` is set
    fn vertices(
        &self,
        xy_pos: usize,
        z_pos: Option<usize>,
        from: usize,
        to: usize,
    ) -> Result<PartBuffer> {
        let dimensions = if z_pos.is_some() { 3 } else { 2 };
        let mut coords = Vec::with_capacity(((to - from) * dimensions).min(self.buf.len() / 8));
        for i in from..to {
            coords.push(self.f64_at(xy_pos + i * 16)?);
            coords.push(self.f64_at(xy_pos + i * 16 + 8)?);
            if let Some(z_pos) = z_pos {
                coords.push(self.f64_at(z_pos + i * 8)?);
            }
        }
        Ok(PartBuffer::new(dimensions, coords))
    }
}

fn decode_shape(buf: &[u8], record_number: usize) -> Result<RawShape> {
    let content = Content { buf, record_number };
    let code = content.i32_at(0)?;
    let has_z = shape_type::has_z(code);

    match code {
        shape_type::NULL => Ok(RawShape::null()),

        shape_type::POINT | shape_type::POINT_M | shape_type::POINT_Z => {
            let z_pos = has_z.then_some(20);
            let part = content.vertices(4, z_pos, 0, 1)?;
            Ok(RawShape {
                shape_type: code,
                bounding_rectangle: None,
                parts: vec![part],
            })
        }

        shape_type::MULTI_POINT | shape_type::MULTI_POINT_M | shape_type::MULTI_POINT_Z => {
            let rect = content.rectangle_at(4)?;
            let num_points = content.count_at(36)?;
            let xy_pos = 40;
            // z range (16 bytes) precedes the z array
            let z_pos = has_z.then_some(xy_pos + num_points * 16 + 16);
            let part = content.vertices(xy_pos, z_pos, 0, num_points)?;
            Ok(RawShape {
                shape_type: code,
                bounding_rectangle: Some(rect),
                parts: vec![part],
            })
        }

        shape_type::POLYLINE
        | shape_type::POLYLINE_M
        | shape_type::POLYLINE_Z
        | shape_type::POLYGON
        | shape_type::POLYGON_M
        | shape_type::POLYGON_Z => {
            let rect = content.rectangle_at(4)?;
            let num_parts = content.count_at(36)?;
            let num_points = content.count_at(40)?;
            let mut starts = Vec::with_capacity(num_parts.min(buf.len() / 4));
            for i in 0..num_parts {
                starts.push(content.count_at(44 + i * 4)?);
            }
            let xy_pos = 44 + num_parts * 4;
            let z_pos = has_z.then_some(xy_pos + num_points * 16 + 16);

            let mut parts = Vec::with_capacity(starts.len());
            for (i, &from) in starts.iter().enumerate() {
                let to = starts.get(i + 1).copied().unwrap_or(num_points);
                if from > to || to > num_points {
                    return Err(ShapeError::Corruption(format!(
                        "Record {} part {} spans points {}..{} of {}",
                        record_number, i, from, to, num_points
                    )));
                }
                parts.push(content.vertices(xy_pos, z_pos, from, to)?);
            }
            Ok(RawShape {
                shape_type: code,
                bounding_rectangle: Some(rect),
                parts,
            })
        }

        shape_type::MULTI_PATCH => Ok(RawShape {
            shape_type: code,
            bounding_rectangle: Some(content.rectangle_at(4)?),
            parts: Vec::new(),
        }),

        other => {
            tracing::warn!("Record {} has unknown shape type {}", record_number, other);
            Ok(RawShape {
                shape_type: other,
                bounding_rectangle: None,
                parts: Vec::new(),
            })
        }
    }
}
