//! Scrollable cursor over a forward-only shape source
//!
//! The source can only seek to the slot before a record and read forward,
//! so every positioned move is a seek followed by a read whose record
//! number is checked against the one requested. A mismatch means the
//! source and the cursor disagree about where they are; the cursor then
//! drops its row and refuses to continue from a guess.

mod mapping;

pub use mapping::RecordNumberMapping;

use crate::geometry::{self, Geometry};
use crate::storage::{RawRecord, ShapeSource};
use crate::types::AttributeRow;
use crate::{Result, ShapeError};
use tracing::{error, info, warn};

/// Cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    BeforeFirst,
    /// 1-based row
    Positioned(usize),
    AfterLast,
}

/// Record materialized at the cursor position
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    record_number: usize,
    geometry: Geometry,
    attributes: AttributeRow,
}

impl FeatureRecord {
    fn from_raw(raw: RawRecord) -> Self {
        Self {
            record_number: raw.record_number,
            geometry: geometry::decode(raw.record_number, raw.shape),
            attributes: raw.attributes,
        }
    }

    pub fn record_number(&self) -> usize {
        self.record_number
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn attributes(&self) -> &AttributeRow {
        &self.attributes
    }
}

/// Bidirectional, absolutely addressable cursor
pub struct ScrollableCursor<S: ShapeSource> {
    source: S,
    mapping: RecordNumberMapping,
    state: CursorState,
    /// Last record read; reused when the same record is requested again
    current: Option<FeatureRecord>,
}

impl<S: ShapeSource> ScrollableCursor<S> {
    /// Unfiltered cursor over every record of `source`
    pub fn new(source: S) -> Self {
        Self::with_mapping(source, RecordNumberMapping::Identity)
    }

    pub fn with_mapping(source: S, mapping: RecordNumberMapping) -> Self {
        Self {
            source,
            mapping,
            state: CursorState::BeforeFirst,
            current: None,
        }
    }

    /// Replace the row mapping and rewind
    pub(crate) fn set_mapping(&mut self, mapping: RecordNumberMapping) {
        self.mapping = mapping;
        self.state = CursorState::BeforeFirst;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn mapping(&self) -> &RecordNumberMapping {
        &self.mapping
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn row_count(&self) -> usize {
        self.mapping.row_count(self.source.total_record_count())
    }

    /// Current 1-based row, 0 unless positioned
    pub fn row(&self) -> usize {
        match self.state {
            CursorState::Positioned(row) => row,
            _ => 0,
        }
    }

    pub fn is_before_first(&self) -> bool {
        self.state == CursorState::BeforeFirst
    }

    pub fn is_after_last(&self) -> bool {
        self.state == CursorState::AfterLast
    }

    pub fn is_first(&self) -> bool {
        self.is_at_row(1)
    }

    pub fn is_last(&self) -> bool {
        self.is_at_row(self.row_count())
    }

    /// Compares record numbers, not row numbers
    fn is_at_row(&self, row: usize) -> bool {
        if !matches!(self.state, CursorState::Positioned(_)) {
            return false;
        }
        let expected = self.mapping.record_number(row, self.source.total_record_count());
        match (&self.current, expected) {
            (Some(record), Some(expected)) => record.record_number == expected,
            _ => false,
        }
    }

    /// Move to `row` (1-based). Returns whether the cursor is on a row.
    pub fn absolute(&mut self, row: i64) -> Result<bool> {
        let row_count = self.row_count();
        if row < 1 {
            info!(row, "absolute({}) is before the first row", row);
            self.state = CursorState::BeforeFirst;
            return Ok(false);
        }
        if row as u64 > row_count as u64 {
            info!(row, row_count, "absolute({}) is past the last row", row);
            self.state = if row_count == 0 {
                CursorState::BeforeFirst
            } else {
                CursorState::AfterLast
            };
            return Ok(false);
        }

        let row = row as usize;
        let record_number = self
            .mapping
            .record_number(row, self.source.total_record_count())
            .ok_or_else(|| ShapeError::InvalidData(format!("row {} has no record number", row)))?;

        match self.load(record_number) {
            Ok(()) => {
                self.state = CursorState::Positioned(row);
                Ok(true)
            }
            Err(e) => {
                self.current = None;
                self.state = CursorState::BeforeFirst;
                Err(e)
            }
        }
    }

    pub fn relative(&mut self, rows: i64) -> Result<bool> {
        match rows {
            1 => self.next(),
            -1 => self.previous(),
            _ => self.absolute((self.row() as i64).saturating_add(rows)),
        }
    }

    pub fn next(&mut self) -> Result<bool> {
        match self.state {
            CursorState::BeforeFirst => self.first(),
            CursorState::AfterLast => {
                warn!("next() called after the last row");
                Ok(false)
            }
            CursorState::Positioned(row) => self.absolute(row as i64 + 1),
        }
    }

    pub fn previous(&mut self) -> Result<bool> {
        match self.state {
            CursorState::BeforeFirst => Ok(false),
            CursorState::AfterLast => self.last(),
            CursorState::Positioned(row) => self.absolute(row as i64 - 1),
        }
    }

    pub fn first(&mut self) -> Result<bool> {
        self.absolute(1)
    }

    pub fn last(&mut self) -> Result<bool> {
        self.absolute(self.row_count() as i64)
    }

    pub fn before_first(&mut self) {
        self.state = CursorState::BeforeFirst;
    }

    /// No-op on an empty cursor
    pub fn after_last(&mut self) {
        if self.row_count() > 0 {
            self.state = CursorState::AfterLast;
        }
    }

    /// Record at the cursor position
    pub fn current_record(&self) -> Result<&FeatureRecord> {
        let reason = match (self.state, &self.current) {
            (CursorState::Positioned(_), Some(record)) => return Ok(record),
            (CursorState::Positioned(_), None) => "no record is loaded",
            (CursorState::BeforeFirst, _) => "the cursor is before the first row",
            (CursorState::AfterLast, _) => "the cursor is after the last row",
        };
        error!("current record requested but {}", reason);
        Err(ShapeError::CursorNotPositioned(reason.to_string()))
    }

    /// Seek-then-read with a verified postcondition.
    fn load(&mut self, record_number: usize) -> Result<()> {
        if !self.source.seek_before(record_number)? {
            error!(record_number, "source could not seek to record");
            return Err(ShapeError::RecordSync {
                expected: record_number,
                found: None,
            });
        }
        if matches!(&self.current, Some(record) if record.record_number == record_number) {
            return Ok(());
        }

        match self.source.read_next()? {
            Some(raw) if raw.record_number == record_number => {
                self.current = Some(FeatureRecord::from_raw(raw));
                Ok(())
            }
            other => {
                let found = other.map(|raw| raw.record_number);
                error!(
                    expected = record_number,
                    ?found,
                    "source returned the wrong record after seeking"
                );
                Err(ShapeError::RecordSync {
                    expected: record_number,
                    found,
                })
            }
        }
    }
}
