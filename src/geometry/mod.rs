//! Uniform geometry model over raw shape records
//!
//! Every record, whatever its shape type, is exposed as a [`Geometry`]: a
//! [`ShapeKind`], a [`BoundingBox`] and an ordered list of [`Part`]s.

mod part;

pub use part::Part;

use crate::storage::{shape_type, RawShape};
use crate::types::BoundingBox;
use crate::{Result, ShapeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Geometry classification of a shape record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Null,
    Point,
    MultiPoint,
    Polyline,
    Polygon,
    MultiPatch,
    Undefined,
}

impl ShapeKind {
    /// Classify an ESRI shape type code. M and Z variants map to their base
    /// kind; unknown codes are `Undefined`.
    pub fn classify(code: i32) -> Self {
        match code {
            shape_type::NULL => ShapeKind::Null,
            shape_type::POINT | shape_type::POINT_M | shape_type::POINT_Z => ShapeKind::Point,
            shape_type::MULTI_POINT | shape_type::MULTI_POINT_M | shape_type::MULTI_POINT_Z => {
                ShapeKind::MultiPoint
            }
            shape_type::POLYLINE | shape_type::POLYLINE_M | shape_type::POLYLINE_Z => {
                ShapeKind::Polyline
            }
            shape_type::POLYGON | shape_type::POLYGON_M | shape_type::POLYGON_Z => {
                ShapeKind::Polygon
            }
            shape_type::MULTI_PATCH => ShapeKind::MultiPatch,
            _ => ShapeKind::Undefined,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Null => "Null",
            ShapeKind::Point => "Point",
            ShapeKind::MultiPoint => "MultiPoint",
            ShapeKind::Polyline => "Polyline",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::MultiPatch => "MultiPatch",
            ShapeKind::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}

/// Decoded geometry of one record
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    kind: ShapeKind,
    bounds: BoundingBox,
    parts: Vec<Part>,
    record_number: usize,
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Extents; the missing box for Null shapes
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Parts in the order they appear in the record
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn num_points(&self) -> usize {
        self.parts.iter().map(Part::num_points).sum()
    }

    pub fn record_number(&self) -> usize {
        self.record_number
    }

    /// Identifier unique within the dataset
    pub fn unique_id(&self) -> String {
        self.record_number.to_string()
    }

    /// `(x, y)` of a Point geometry
    pub fn point(&self) -> Result<(f64, f64)> {
        if self.kind != ShapeKind::Point {
            return Err(ShapeError::UnsupportedShape(format!(
                "point() does not support {} geometries",
                self.kind
            )));
        }
        self.parts
            .first()
            .and_then(|part| part.point(0))
            .map(|vertex| (vertex[0], vertex[1]))
            .ok_or_else(|| ShapeError::UnsupportedShape("point geometry has no vertex".into()))
    }

    /// `(x, y)` paths for drawing, one per part. Polygon rings are closed by
    /// repeating their first vertex; polyline parts are left open.
    pub fn outline(&self) -> Result<Vec<Vec<(f64, f64)>>> {
        let close = match self.kind {
            ShapeKind::Polygon => true,
            ShapeKind::Polyline => false,
            other => {
                return Err(ShapeError::UnsupportedShape(format!(
                    "outline() does not support {} geometries",
                    other
                )))
            }
        };
        let paths = self
            .parts
            .iter()
            .map(|part| {
                let mut path: Vec<(f64, f64)> = part.points().map(|v| (v[0], v[1])).collect();
                if close {
                    if let Some(&first) = path.first() {
                        path.push(first);
                    }
                }
                path
            })
            .collect();
        Ok(paths)
    }
}

/// Wrap a raw shape as a [`Geometry`].
///
/// Bounds follow the shape kind: the missing box for Null, a degenerate box
/// at the vertex for Point, the record's `[yMin, yMax, xMin, xMax]`
/// rectangle for everything else. Parts that are not 2-D or 3-D, or that
/// end mid-vertex, are dropped with a warning.
pub fn decode(record_number: usize, shape: RawShape) -> Geometry {
    let kind = ShapeKind::classify(shape.shape_type);
    let RawShape {
        bounding_rectangle,
        parts,
        ..
    } = shape;

    let (bounds, parts) = match kind {
        ShapeKind::Null => (BoundingBox::missing(), Vec::new()),
        ShapeKind::Point => {
            let bounds = parts
                .first()
                .filter(|p| matches!(p.dimensions, 2 | 3))
                .and_then(|p| p.coords.get(0..2))
                .map_or_else(BoundingBox::missing, |xy| BoundingBox::from_point(xy[1], xy[0]));
            (bounds, parts)
        }
        ShapeKind::MultiPoint | ShapeKind::Polyline | ShapeKind::Polygon => {
            let bounds = bounding_rectangle
                .map(BoundingBox::from_rectangle)
                .unwrap_or_else(BoundingBox::missing);
            (bounds, parts)
        }
        // Classified only, their parts are not decoded
        ShapeKind::MultiPatch | ShapeKind::Undefined => {
            let bounds = bounding_rectangle
                .map(BoundingBox::from_rectangle)
                .unwrap_or_else(BoundingBox::missing);
            (bounds, Vec::new())
        }
    };

    Geometry {
        kind,
        bounds,
        parts: parts
            .into_iter()
            .filter_map(|buffer| match Part::try_from(buffer) {
                Ok(part) => Some(part),
                Err(buffer) => {
                    warn!(
                        record_number,
                        dimensions = buffer.dimensions,
                        values = buffer.coords.len(),
                        "dropping malformed part"
                    );
                    None
                }
            })
            .collect(),
        record_number,
    }
}
