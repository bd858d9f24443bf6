//! Geographic coordinate and bounding box types

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoord {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Axis-aligned lat/lon extents.
///
/// The "missing" box (e.g. the bounds of a Null shape) has no meaningful
/// corners. It must be detected with [`BoundingBox::is_missing`]; it never
/// contains, intersects, or is contained by anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    southwest: GeoCoord,
    northeast: GeoCoord,
    missing: bool,
}

impl BoundingBox {
    /// Build a box from its edges. Corners given out of order are normalized
    /// into southwest/northeast.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::from_corners(GeoCoord::new(south, west), GeoCoord::new(north, east))
    }

    /// Build a box from any two opposite corners.
    pub fn from_corners(a: GeoCoord, b: GeoCoord) -> Self {
        if [a.latitude, a.longitude, b.latitude, b.longitude]
            .iter()
            .any(|v| v.is_nan())
        {
            return Self::missing();
        }
        Self {
            southwest: GeoCoord::new(a.latitude.min(b.latitude), a.longitude.min(b.longitude)),
            northeast: GeoCoord::new(a.latitude.max(b.latitude), a.longitude.max(b.longitude)),
            missing: false,
        }
    }

    /// Build a box from a shapefile rectangle ordered `[yMin, yMax, xMin, xMax]`.
    pub fn from_rectangle(rect: [f64; 4]) -> Self {
        let [y_min, y_max, x_min, x_max] = rect;
        Self::new(y_min, x_min, y_max, x_max)
    }

    /// Degenerate box whose two corners are the same coordinate.
    pub fn from_point(latitude: f64, longitude: f64) -> Self {
        let corner = GeoCoord::new(latitude, longitude);
        Self::from_corners(corner, corner)
    }

    /// The sentinel box for geometries without extents.
    pub fn missing() -> Self {
        Self {
            southwest: GeoCoord::new(f64::NAN, f64::NAN),
            northeast: GeoCoord::new(f64::NAN, f64::NAN),
            missing: true,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }

    pub fn southwest(&self) -> GeoCoord {
        self.southwest
    }

    pub fn northeast(&self) -> GeoCoord {
        self.northeast
    }

    pub fn south(&self) -> f64 {
        self.southwest.latitude
    }

    pub fn west(&self) -> f64 {
        self.southwest.longitude
    }

    pub fn north(&self) -> f64 {
        self.northeast.latitude
    }

    pub fn east(&self) -> f64 {
        self.northeast.longitude
    }

    /// Degrees of longitude spanned
    pub fn width(&self) -> f64 {
        self.east() - self.west()
    }

    /// Degrees of latitude spanned
    pub fn height(&self) -> f64 {
        self.north() - self.south()
    }

    pub fn contains_coord(&self, coord: &GeoCoord) -> bool {
        !self.missing
            && coord.latitude >= self.south()
            && coord.latitude <= self.north()
            && coord.longitude >= self.west()
            && coord.longitude <= self.east()
    }

    /// True when both corners of `other` lie inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        !other.missing
            && self.contains_coord(&other.southwest)
            && self.contains_coord(&other.northeast)
    }

    /// Corner containment in either direction, or a full edge-to-edge
    /// straddle along one axis. The straddle checks catch the "plus sign"
    /// overlap where no corner of either box lies inside the other.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        if self.missing || other.missing {
            return false;
        }
        if self.contains_coord(&other.southwest)
            || self.contains_coord(&other.northeast)
            || other.contains_coord(&self.southwest)
            || other.contains_coord(&self.northeast)
        {
            return true;
        }
        // `other` crosses this box from south to north
        let crosses_vertically = self.south() >= other.south()
            && self.north() <= other.north()
            && self.west() <= other.west()
            && self.east() >= other.east();
        // `other` crosses this box from west to east
        let crosses_horizontally = self.south() <= other.south()
            && self.north() >= other.north()
            && self.west() >= other.west()
            && self.east() <= other.east();
        crosses_vertically || crosses_horizontally
    }

    /// Back to the shapefile rectangle layout `[yMin, yMax, xMin, xMax]`.
    pub fn to_rectangle(&self) -> [f64; 4] {
        [self.south(), self.north(), self.west(), self.east()]
    }
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        match (self.missing, other.missing) {
            (true, true) => true,
            (false, false) => {
                self.southwest == other.southwest && self.northeast == other.northeast
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rectangle_ordering() {
        let bbox = BoundingBox::from_rectangle([10.0, 20.0, -5.0, 5.0]);
        assert_eq!(bbox.southwest(), GeoCoord::new(10.0, -5.0));
        assert_eq!(bbox.northeast(), GeoCoord::new(20.0, 5.0));
        assert_eq!(bbox.to_rectangle(), [10.0, 20.0, -5.0, 5.0]);
    }

    #[test]
    fn test_corners_are_normalized() {
        let bbox = BoundingBox::new(20.0, 5.0, 10.0, -5.0);
        assert_eq!(bbox.southwest(), GeoCoord::new(10.0, -5.0));
        assert_eq!(bbox.northeast(), GeoCoord::new(20.0, 5.0));
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 10.0);
    }

    #[test]
    fn test_bbox_contains() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&BoundingBox::new(2.0, 2.0, 8.0, 8.0)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(outer.contains(&BoundingBox::from_point(10.0, 0.0)));
    }

    #[test]
    fn test_bbox_intersects_corners() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_bbox_intersects_straddle() {
        // Tall thin box crossing a short wide one: no corner is shared.
        let wide = BoundingBox::new(4.0, 0.0, 6.0, 10.0);
        let tall = BoundingBox::new(0.0, 4.0, 10.0, 6.0);
        assert!(wide.intersects(&tall));
        assert!(tall.intersects(&wide));
    }

    #[test]
    fn test_degenerate_point_box() {
        let query = BoundingBox::new(2.0, -1.0, 4.0, 1.0);
        assert!(BoundingBox::from_point(2.0, 0.0).intersects(&query));
        assert!(BoundingBox::from_point(4.0, 0.0).intersects(&query));
        assert!(!BoundingBox::from_point(5.0, 0.0).intersects(&query));
    }

    #[test]
    fn test_missing_box() {
        let missing = BoundingBox::missing();
        let bbox = BoundingBox::new(-90.0, -180.0, 90.0, 180.0);
        assert!(missing.is_missing());
        assert!(!bbox.is_missing());
        assert!(!missing.intersects(&bbox));
        assert!(!bbox.intersects(&missing));
        assert!(!bbox.contains(&missing));
        assert!(!missing.contains(&bbox));
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_missing());
        assert_eq!(missing, BoundingBox::missing());
    }
}
