//! Immutable coordinate sequence of one geometry part

use crate::storage::PartBuffer;
use std::sync::OnceLock;

/// Per-axis copies of a part's coordinates
#[derive(Debug, Clone)]
struct Axes {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

/// One ring, line or point group of a geometry.
///
/// Coordinates are stored interleaved as read from the file. The per-axis
/// arrays are built on first request and kept; the part never changes, so
/// they never go stale.
#[derive(Debug, Clone)]
pub struct Part {
    dimensions: usize,
    coords: Vec<f64>,
    axes: OnceLock<Axes>,
}

impl Part {
    /// `None` unless `dimensions` is 2 or 3 and `coords` holds whole vertices
    pub fn new(dimensions: usize, coords: Vec<f64>) -> Option<Self> {
        Part::try_from(PartBuffer { dimensions, coords }).ok()
    }

    /// 2 for `(x, y)`, 3 for `(x, y, z)`
    pub fn num_dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn num_points(&self) -> usize {
        self.coords.len() / self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Vertex `index` as a `dimensions`-long slice
    pub fn point(&self, index: usize) -> Option<&[f64]> {
        let start = index * self.dimensions;
        self.coords.get(start..start + self.dimensions)
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.coords.chunks_exact(self.dimensions)
    }

    /// Interleaved coordinates
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn x(&self) -> &[f64] {
        &self.axes().x
    }

    pub fn y(&self) -> &[f64] {
        &self.axes().y
    }

    /// Zeros for 2-D parts
    pub fn z(&self) -> &[f64] {
        &self.axes().z
    }

    fn axes(&self) -> &Axes {
        self.axes.get_or_init(|| {
            let n = self.num_points();
            let mut axes = Axes {
                x: Vec::with_capacity(n),
                y: Vec::with_capacity(n),
                z: vec![0.0; n],
            };
            for (i, vertex) in self.points().enumerate() {
                axes.x.push(vertex[0]);
                axes.y.push(vertex[1]);
                if self.dimensions == 3 {
                    axes.z[i] = vertex[2];
                }
            }
            axes
        })
    }
}

impl TryFrom<PartBuffer> for Part {
    type Error = PartBuffer;

    /// Hands the buffer back when its shape is unusable
    fn try_from(buffer: PartBuffer) -> Result<Self, PartBuffer> {
        if !(buffer.dimensions == 2 || buffer.dimensions == 3)
            || buffer.coords.len() % buffer.dimensions != 0
        {
            return Err(buffer);
        }
        Ok(Part {
            dimensions: buffer.dimensions,
            coords: buffer.coords,
            axes: OnceLock::new(),
        })
    }
}

impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions && self.coords == other.coords
    }
}
