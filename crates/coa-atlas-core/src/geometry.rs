//! Quadrilateral intersection used by the packer's overlap test.
//!
//! Footprints are axis-aligned in practice, but the test works on any convex
//! quad: all 4x4 edge pairs are checked for proper crossings, then the edge
//! normals of both quads are tried as separating axes to catch enclosure and
//! collinear overlap, which produce no crossing.

use crate::model::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// True when the segments cross at a point interior to both.
    /// Touching endpoints and collinear overlap are not crossings.
    pub fn crosses(&self, other: &Segment) -> bool {
        let d1 = cross(other.a, other.b, self.a);
        let d2 = cross(other.a, other.b, self.b);
        let d3 = cross(self.a, self.b, other.a);
        let d4 = cross(self.a, self.b, other.b);
        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }
}

/// Convex quadrilateral given by its corners in winding order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    pub fn from_rect(r: &Rect) -> Self {
        let (x0, y0) = (r.x as f64, r.y as f64);
        let (x1, y1) = (r.right() as f64, r.bottom() as f64);
        Self::new([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    pub fn edges(&self) -> [Segment; 4] {
        let c = &self.corners;
        [
            Segment::new(c[0], c[1]),
            Segment::new(c[1], c[2]),
            Segment::new(c[2], c[3]),
            Segment::new(c[3], c[0]),
        ]
    }

    /// Any of the 16 edge pairs cross.
    pub fn edges_cross(&self, other: &Quad) -> bool {
        let theirs = other.edges();
        self.edges()
            .iter()
            .any(|mine| theirs.iter().any(|t| mine.crosses(t)))
    }

    fn projection(&self, axis: Point) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in &self.corners {
            let d = c.x * axis.x + c.y * axis.y;
            lo = lo.min(d);
            hi = hi.max(d);
        }
        (lo, hi)
    }

    /// True if some edge normal of either quad separates them.
    /// Touching projections count as separated.
    fn separated(&self, other: &Quad) -> bool {
        self.edges().iter().chain(other.edges().iter()).any(|e| {
            let axis = Point::new(e.a.y - e.b.y, e.b.x - e.a.x);
            if axis.x == 0.0 && axis.y == 0.0 {
                // degenerate edge: a zero-area quad has no interior
                return true;
            }
            let (a_lo, a_hi) = self.projection(axis);
            let (b_lo, b_hi) = other.projection(axis);
            a_hi <= b_lo || b_hi <= a_lo
        })
    }

    pub fn intersects(&self, other: &Quad) -> bool {
        self.edges_cross(other) || !self.separated(other)
    }
}
