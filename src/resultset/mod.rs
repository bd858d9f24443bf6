//! Read-only, scrollable result set over a shapefile
//!
//! ```no_run
//! use shpcursor::{BoundingBox, ShapefileResultSet};
//!
//! # fn main() -> shpcursor::Result<()> {
//! let bounds = BoundingBox::new(34.0, -120.0, 35.0, -119.0);
//! let mut rows = ShapefileResultSet::open_bounds_path("roads.shp", bounds)?;
//! while rows.next()? {
//!     let name = rows.get_string("NAME")?;
//!     let feature = rows.get_feature()?;
//!     println!("{} {} {}", rows.row(), name, feature.kind());
//! }
//! # Ok(())
//! # }
//! ```

mod coercion;

use crate::catalog::ColumnCatalog;
use crate::config::ReaderConfig;
use crate::cursor::{FeatureRecord, ScrollableCursor};
use crate::geometry::Geometry;
use crate::query::Query;
use crate::storage::{MappedShapefile, ShapeSource};
use crate::types::{BoundingBox, ColumnType, Value};
use crate::{Result, ShapeError};
use std::path::Path;
use tracing::{debug, error};

/// Column reference accepted by the getters: a label or a 1-based index,
/// with 0 naming the feature pseudo-column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    Index(usize),
    Label(&'a str),
}

impl From<usize> for ColumnRef<'_> {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnRef<'a> {
    fn from(label: &'a str) -> Self {
        ColumnRef::Label(label)
    }
}

impl<'a> From<&'a String> for ColumnRef<'a> {
    fn from(label: &'a String) -> Self {
        ColumnRef::Label(label)
    }
}

/// What [`ShapefileResultSet::get_object`] returns
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue<'a> {
    Feature(&'a Geometry),
    Attribute(Value),
}

impl ColumnValue<'_> {
    pub fn as_feature(&self) -> Option<&Geometry> {
        match self {
            ColumnValue::Feature(geometry) => Some(geometry),
            ColumnValue::Attribute(_) => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Value> {
        match self {
            ColumnValue::Attribute(value) => Some(value),
            ColumnValue::Feature(_) => None,
        }
    }
}

/// Column resolved against the catalog
struct Resolved<'c> {
    index: usize,
    label: &'c str,
}

pub struct ShapefileResultSet<S: ShapeSource> {
    cursor: ScrollableCursor<S>,
    catalog: ColumnCatalog,
    bounds: BoundingBox,
}

impl ShapefileResultSet<MappedShapefile> {
    /// Every record of the shapefile at `path`
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path(path, Query::All, &ReaderConfig::default())
    }

    /// Records of the shapefile at `path` intersecting `bounds`
    pub fn open_bounds_path<P: AsRef<Path>>(path: P, bounds: BoundingBox) -> Result<Self> {
        Self::from_path(path, Query::Bounds(bounds), &ReaderConfig::default())
    }

    pub fn from_path<P: AsRef<Path>>(path: P, query: Query, config: &ReaderConfig) -> Result<Self> {
        let source = MappedShapefile::open_with_config(path, config)?;
        Self::with_config(source, query, config)
    }
}

impl<S: ShapeSource> ShapefileResultSet<S> {
    /// Every record of `source`
    pub fn open(source: S) -> Self {
        let catalog = Self::catalog_for(&source, crate::config::DEFAULT_FEATURE_COLUMN_LABEL);
        let bounds = BoundingBox::from_rectangle(source.overall_bounds());
        Self {
            cursor: ScrollableCursor::new(source),
            catalog,
            bounds,
        }
    }

    /// Records whose bounds intersect `bounds`
    pub fn with_bounds(source: S, bounds: BoundingBox) -> Result<Self> {
        Self::with_config(source, Query::Bounds(bounds), &ReaderConfig::default())
    }

    /// Records whose `column` equals `value` in string form
    pub fn with_attribute(source: S, column: &str, value: &str, ignore_case: bool) -> Result<Self> {
        Self::with_config(
            source,
            Query::attribute(column, value, ignore_case),
            &ReaderConfig::default(),
        )
    }

    /// Run `query` over `source` and position before the first match
    pub fn with_config(source: S, query: Query, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Self::catalog_for(&source, &config.feature_column_label);
        let bounds = match &query {
            Query::Bounds(bounds) => *bounds,
            _ => BoundingBox::from_rectangle(source.overall_bounds()),
        };

        let mut cursor = ScrollableCursor::new(source);
        let mapping = query.prescan(&mut cursor)?;
        cursor.set_mapping(mapping);
        debug!(
            dataset = cursor.source().dataset_name(),
            rows = cursor.row_count(),
            "result set opened"
        );

        Ok(Self {
            cursor,
            catalog,
            bounds,
        })
    }

    fn catalog_for(source: &S, feature_label: &str) -> ColumnCatalog {
        ColumnCatalog::new(
            source.dataset_name(),
            source.shape_type_name(),
            feature_label,
            source.field_descriptors().to_vec(),
        )
    }

    // Navigation

    pub fn next(&mut self) -> Result<bool> {
        self.cursor.next()
    }

    pub fn previous(&mut self) -> Result<bool> {
        self.cursor.previous()
    }

    pub fn first(&mut self) -> Result<bool> {
        self.cursor.first()
    }

    pub fn last(&mut self) -> Result<bool> {
        self.cursor.last()
    }

    pub fn absolute(&mut self, row: i64) -> Result<bool> {
        self.cursor.absolute(row)
    }

    pub fn relative(&mut self, rows: i64) -> Result<bool> {
        self.cursor.relative(rows)
    }

    pub fn before_first(&mut self) {
        self.cursor.before_first()
    }

    pub fn after_last(&mut self) {
        self.cursor.after_last()
    }

    pub fn is_before_first(&self) -> bool {
        self.cursor.is_before_first()
    }

    pub fn is_after_last(&self) -> bool {
        self.cursor.is_after_last()
    }

    pub fn is_first(&self) -> bool {
        self.cursor.is_first()
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_last()
    }

    /// Current 1-based row, 0 unless positioned
    pub fn row(&self) -> usize {
        self.cursor.row()
    }

    pub fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    // Metadata

    pub fn metadata(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn find_column(&self, label: &str) -> Result<usize> {
        self.catalog.find_column(label)
    }

    /// Name of the underlying dataset
    pub fn cursor_name(&self) -> &str {
        self.cursor.source().dataset_name()
    }

    /// The query box, or the dataset extents when none was given
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn source(&self) -> &S {
        self.cursor.source()
    }

    // Getters

    /// Geometry of the current row
    pub fn get_feature(&self) -> Result<&Geometry> {
        Ok(self.cursor.current_record()?.geometry())
    }

    pub fn get_string<'c>(&self, column: impl Into<ColumnRef<'c>>) -> Result<String> {
        let record = self.cursor.current_record()?;
        let resolved = self.resolve(column.into())?;
        let (_, value) = self.attribute(record, &resolved, "String")?;
        Ok(coercion::to_string(value))
    }

    pub fn get_long<'c>(&self, column: impl Into<ColumnRef<'c>>) -> Result<i64> {
        let record = self.cursor.current_record()?;
        let resolved = self.resolve(column.into())?;
        let (column_type, value) = self.attribute(record, &resolved, "Long")?;
        coercion::to_long(resolved.label, column_type, value)
    }

    pub fn get_double<'c>(&self, column: impl Into<ColumnRef<'c>>) -> Result<f64> {
        let record = self.cursor.current_record()?;
        let resolved = self.resolve(column.into())?;
        let (column_type, value) = self.attribute(record, &resolved, "Double")?;
        coercion::to_double(resolved.label, column_type, value)
    }

    pub fn get_boolean<'c>(&self, column: impl Into<ColumnRef<'c>>) -> Result<bool> {
        let record = self.cursor.current_record()?;
        let resolved = self.resolve(column.into())?;
        let (_, value) = self.attribute(record, &resolved, "Boolean")?;
        coercion::to_boolean(resolved.label, value)
    }

    /// The geometry for the feature column, otherwise the attribute value
    /// with nulls replaced by the column type's default
    pub fn get_object<'c>(&self, column: impl Into<ColumnRef<'c>>) -> Result<ColumnValue<'_>> {
        let record = self.cursor.current_record()?;
        let resolved = self.resolve(column.into())?;
        if resolved.index == 0 {
            return Ok(ColumnValue::Feature(record.geometry()));
        }
        let (column_type, value) = self.attribute(record, &resolved, "Object")?;
        coercion::to_object(resolved.label, column_type, value).map(ColumnValue::Attribute)
    }

    fn resolve<'s>(&'s self, column: ColumnRef<'_>) -> Result<Resolved<'s>> {
        let index = match column {
            ColumnRef::Index(index) => {
                // Validates the index
                self.catalog.column_label_at(index)?;
                index
            }
            ColumnRef::Label(label) => self.catalog.find_column(label)?,
        };
        let label = self.catalog.column_label_at(index)?;
        Ok(Resolved { index, label })
    }

    /// Declared type and cell value of an attribute column. Cells missing
    /// from the row read as null.
    fn attribute<'r>(
        &self,
        record: &'r FeatureRecord,
        resolved: &Resolved<'_>,
        target: &'static str,
    ) -> Result<(ColumnType, &'r Value)> {
        if resolved.index == 0 {
            error!(column = resolved.label, target, "feature column read as an attribute");
            return Err(ShapeError::TypeConversion {
                column: resolved.label.to_string(),
                target,
                found: "Geometry".to_string(),
            });
        }
        let column_type = self.catalog.column_type(resolved.index)?;
        let value = record.attributes().get(resolved.label).unwrap_or(&Value::Null);
        Ok((column_type, value))
    }
}
