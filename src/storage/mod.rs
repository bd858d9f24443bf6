//! Shapefile storage layer
//!
//! The cursor never touches files directly. It drives a [`ShapeSource`],
//! which models the forward-only access the shapefile format offers:
//! position the read pointer just before a record, then read (and advance
//! past) the next one.
//!
//! - [`MappedShapefile`]: `.shp` + `.shx` + `.dbf` on disk, memory-mapped
//! - [`MemoryShapeSource`]: records held in memory

mod dbase;
mod memory;
mod shapefile;

pub use dbase::DBaseFile;
pub use memory::MemoryShapeSource;
pub use shapefile::MappedShapefile;

use crate::types::{AttributeRow, FieldDescriptor};
use crate::Result;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

/// ESRI shape type codes
pub mod shape_type {
    pub const NULL: i32 = 0;
    pub const POINT: i32 = 1;
    pub const POLYLINE: i32 = 3;
    pub const POLYGON: i32 = 5;
    pub const MULTI_POINT: i32 = 8;
    pub const POINT_Z: i32 = 11;
    pub const POLYLINE_Z: i32 = 13;
    pub const POLYGON_Z: i32 = 15;
    pub const MULTI_POINT_Z: i32 = 18;
    pub const POINT_M: i32 = 21;
    pub const POLYLINE_M: i32 = 23;
    pub const POLYGON_M: i32 = 25;
    pub const MULTI_POINT_M: i32 = 28;
    pub const MULTI_PATCH: i32 = 31;

    /// Human-readable name of a shape type code
    pub fn name(code: i32) -> &'static str {
        match code {
            NULL => "Null",
            POINT => "Point",
            POLYLINE => "PolyLine",
            POLYGON => "Polygon",
            MULTI_POINT => "MultiPoint",
            POINT_Z => "PointZ",
            POLYLINE_Z => "PolyLineZ",
            POLYGON_Z => "PolygonZ",
            MULTI_POINT_Z => "MultiPointZ",
            POINT_M => "PointM",
            POLYLINE_M => "PolyLineM",
            POLYGON_M => "PolygonM",
            MULTI_POINT_M => "MultiPointM",
            MULTI_PATCH => "MultiPatch",
            _ => "Unknown",
        }
    }

    /// Z variants carry a third coordinate per vertex
    pub fn has_z(code: i32) -> bool {
        matches!(code, POINT_Z | POLYLINE_Z | POLYGON_Z | MULTI_POINT_Z | MULTI_PATCH)
    }
}

/// Contents of a whole file, either memory-mapped or read into memory
pub(crate) enum FileBytes {
    Mapped(Mmap),
    Loaded(Vec<u8>),
}

impl FileBytes {
    pub(crate) fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        if !path.exists() {
            return Err(crate::ShapeError::FileNotFound(path.to_path_buf()));
        }
        if use_mmap {
            let file = File::open(path)?;
            // Empty files cannot be mapped on every platform
            if file.metadata()?.len() == 0 {
                return Ok(FileBytes::Loaded(Vec::new()));
            }
            // SAFETY: the mapping is read-only and the crate never writes
            // through it; concurrent external truncation is outside the
            // single-reader contract of the sources.
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            Ok(FileBytes::Mapped(mmap))
        } else {
            Ok(FileBytes::Loaded(std::fs::read(path)?))
        }
    }
}

impl Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(mmap) => mmap,
            FileBytes::Loaded(bytes) => bytes,
        }
    }
}

/// Flat coordinate buffer for one part: `dimensions` values per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct PartBuffer {
    /// 2 (x, y) or 3 (x, y, z)
    pub dimensions: usize,
    pub coords: Vec<f64>,
}

impl PartBuffer {
    pub fn new(dimensions: usize, coords: Vec<f64>) -> Self {
        debug_assert!(dimensions == 2 || dimensions == 3);
        debug_assert_eq!(coords.len() % dimensions, 0);
        Self { dimensions, coords }
    }

    /// Build a 2-D buffer from `(x, y)` pairs
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        let coords = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        Self::new(2, coords)
    }

    pub fn num_points(&self) -> usize {
        self.coords.len().checked_div(self.dimensions).unwrap_or(0)
    }
}

/// Geometry portion of a decoded shape record
#[derive(Debug, Clone, PartialEq)]
pub struct RawShape {
    /// ESRI shape type code, see [`shape_type`]
    pub shape_type: i32,
    /// `[yMin, yMax, xMin, xMax]`, present on variable-length shapes only
    pub bounding_rectangle: Option<[f64; 4]>,
    pub parts: Vec<PartBuffer>,
}

impl RawShape {
    pub fn null() -> Self {
        Self {
            shape_type: shape_type::NULL,
            bounding_rectangle: None,
            parts: Vec::new(),
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self {
            shape_type: shape_type::POINT,
            bounding_rectangle: None,
            parts: vec![PartBuffer::new(2, vec![x, y])],
        }
    }

    /// Variable-length shape whose rectangle is computed from its parts
    pub fn with_parts(shape_type: i32, parts: Vec<PartBuffer>) -> Self {
        let mut rect: Option<[f64; 4]> = None;
        for part in parts.iter().filter(|part| part.dimensions >= 2) {
            for vertex in part.coords.chunks_exact(part.dimensions) {
                let (x, y) = (vertex[0], vertex[1]);
                rect = Some(match rect {
                    None => [y, y, x, x],
                    Some([y_min, y_max, x_min, x_max]) => {
                        [y_min.min(y), y_max.max(y), x_min.min(x), x_max.max(x)]
                    }
                });
            }
        }
        Self {
            shape_type,
            bounding_rectangle: rect,
            parts,
        }
    }
}

/// One shape record plus its attribute row
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based record number
    pub record_number: usize,
    pub shape: RawShape,
    pub attributes: AttributeRow,
}

/// Forward-only shape record provider.
///
/// Implementations hold a single read pointer; they are not meant to be
/// shared between cursors.
pub trait ShapeSource {
    /// Position the read pointer just before `record_number` so the next
    /// [`read_next`](ShapeSource::read_next) returns it. `Ok(false)` when the
    /// record number is out of range.
    fn seek_before(&mut self, record_number: usize) -> Result<bool>;

    /// Decode the record at the read pointer and advance past it.
    /// `Ok(None)` at end of data.
    fn read_next(&mut self) -> Result<Option<RawRecord>>;

    fn total_record_count(&self) -> usize;

    /// Dataset extents as `[yMin, yMax, xMin, xMax]`
    fn overall_bounds(&self) -> [f64; 4];

    fn field_descriptors(&self) -> &[FieldDescriptor];

    fn dataset_name(&self) -> &str;

    /// Shape type declared in the dataset header
    fn shape_type_name(&self) -> &str;
}

impl<S: ShapeSource + ?Sized> ShapeSource for Box<S> {
    fn seek_before(&mut self, record_number: usize) -> Result<bool> {
        (**self).seek_before(record_number)
    }

    fn read_next(&mut self) -> Result<Option<RawRecord>> {
        (**self).read_next()
    }

    fn total_record_count(&self) -> usize {
        (**self).total_record_count()
    }

    fn overall_bounds(&self) -> [f64; 4] {
        (**self).overall_bounds()
    }

    fn field_descriptors(&self) -> &[FieldDescriptor] {
        (**self).field_descriptors()
    }

    fn dataset_name(&self) -> &str {
        (**self).dataset_name()
    }

    fn shape_type_name(&self) -> &str {
        (**self).shape_type_name()
    }
}

#[cfg(test)]
pub(crate) mod test_support;
