//! shpcursor: scrollable, read-only cursors over ESRI shapefiles
//!
//! A [`ShapefileResultSet`] exposes the records of a shapefile as rows of a
//! tabular result: column 0 is the record's geometry, the remaining columns
//! are the `.dbf` attributes. Rows can be narrowed when the result set is
//! opened, either to features whose bounds intersect a [`BoundingBox`] or
//! to records whose attribute equals a value.
//!
//! ## Layers
//! - `storage`: `.shp`/`.shx`/`.dbf` decoding behind the [`ShapeSource`] trait
//! - `geometry`: uniform [`Geometry`] model over the shape types
//! - `cursor`: scrollable cursor with verified seek-then-read positioning
//! - `query`: one-pass prescans that build the row → record mapping
//! - `catalog`: column metadata
//! - `resultset`: the public facade and its typed getters

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod geometry;
pub mod query;
pub mod resultset;
pub mod storage;
pub mod types;

mod error;

pub use catalog::ColumnCatalog;
pub use config::{ReaderConfig, DEFAULT_FEATURE_COLUMN_LABEL};
pub use cursor::{CursorState, FeatureRecord, RecordNumberMapping, ScrollableCursor};
pub use error::{Result, ShapeError};
pub use geometry::{Geometry, Part, ShapeKind};
pub use query::{Query, QueryPrescanner};
pub use resultset::{ColumnRef, ColumnValue, ShapefileResultSet};
pub use storage::{MappedShapefile, MemoryShapeSource, RawRecord, RawShape, ShapeSource};
pub use types::{AttributeRow, BoundingBox, ColumnType, FieldDescriptor, FieldType, GeoCoord, Value};
