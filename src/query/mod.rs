//! Narrowing queries
//!
//! A query walks an unfiltered cursor once, front to back, and collects the
//! record numbers that match. The result set then uses that list as its
//! row mapping.

mod prescan;

pub use prescan::PrescanScope;

use crate::cursor::{RecordNumberMapping, ScrollableCursor};
use crate::storage::ShapeSource;
use crate::types::{BoundingBox, Value};
use crate::{Result, ShapeError};
use tracing::debug;

/// Narrowing applied when a result set is opened
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Every record
    All,
    /// Records whose bounds intersect the box
    Bounds(BoundingBox),
    /// Records whose column equals the value in string form
    Attribute {
        column: String,
        value: String,
        ignore_case: bool,
    },
}

impl Query {
    pub fn attribute(
        column: impl Into<String>,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Self {
        Query::Attribute {
            column: column.into(),
            value: value.into(),
            ignore_case,
        }
    }

    /// Run the prescan this query needs against an unfiltered cursor
    pub fn prescan<S: ShapeSource>(
        &self,
        cursor: &mut ScrollableCursor<S>,
    ) -> Result<RecordNumberMapping> {
        match self {
            Query::All => Ok(RecordNumberMapping::Identity),
            Query::Bounds(bounds) => Ok(QueryPrescanner::bounding_box_filter(cursor, bounds)?
                .unwrap_or(RecordNumberMapping::Identity)),
            Query::Attribute {
                column,
                value,
                ignore_case,
            } => QueryPrescanner::attribute_filter(cursor, column, value, *ignore_case),
        }
    }
}

pub struct QueryPrescanner;

impl QueryPrescanner {
    /// Record numbers whose geometry bounds intersect `bounds`.
    ///
    /// `None` when `bounds` contains the whole dataset, in which case no
    /// record is read and every row qualifies.
    pub fn bounding_box_filter<S: ShapeSource>(
        cursor: &mut ScrollableCursor<S>,
        bounds: &BoundingBox,
    ) -> Result<Option<RecordNumberMapping>> {
        let dataset = BoundingBox::from_rectangle(cursor.source().overall_bounds());
        if bounds.contains(&dataset) {
            debug!("query box covers the dataset, skipping the prescan");
            return Ok(None);
        }

        let mut scope = PrescanScope::new(cursor);
        let mut selected = Vec::new();
        let mut scanned = 0usize;
        while scope.next()? {
            scanned += 1;
            let record = scope.current_record()?;
            if bounds.intersects(record.geometry().bounds()) {
                selected.push(record.record_number());
            }
        }
        debug!(scanned, selected = selected.len(), "bounding box prescan done");
        Ok(Some(RecordNumberMapping::Filtered(selected)))
    }

    /// Record numbers whose `column` reads as `value` in string form.
    /// Null cells read as the empty string.
    pub fn attribute_filter<S: ShapeSource>(
        cursor: &mut ScrollableCursor<S>,
        column: &str,
        value: &str,
        ignore_case: bool,
    ) -> Result<RecordNumberMapping> {
        let declared = cursor
            .source()
            .field_descriptors()
            .iter()
            .any(|field| field.name.eq_ignore_ascii_case(column));
        if !declared {
            return Err(ShapeError::ColumnNotFound(column.to_string()));
        }

        let wanted = if ignore_case { value.to_lowercase() } else { value.to_string() };
        let mut scope = PrescanScope::new(cursor);
        let mut selected = Vec::new();
        let mut scanned = 0usize;
        while scope.next()? {
            scanned += 1;
            let record = scope.current_record()?;
            let text = record
                .attributes()
                .get(column)
                .map(Value::to_string)
                .unwrap_or_default();
            let matched = if ignore_case {
                text.to_lowercase() == wanted
            } else {
                text == wanted
            };
            if matched {
                selected.push(record.record_number());
            }
        }
        debug!(
            column,
            value,
            ignore_case,
            scanned,
            selected = selected.len(),
            "attribute prescan done"
        );
        Ok(RecordNumberMapping::Filtered(selected))
    }
}
