use crate::geom::point::Point;

/// Returns the (min, max) corners of the box holding all points `pts`.
///
/// An empty slice gives a degenerate box at the origin.
pub fn bounding_box(pts: &[Point]) -> (Point, Point) {
    if pts.is_empty() {
        let origin = Point::new(0., 0., 0.);
        return (origin, origin);
    }
    let mut pmin = pts[0];
    let mut pmax = pts[0];
    for p in pts.iter().skip(1) {
        pmin.x = pmin.x.min(p.x);
        pmin.y = pmin.y.min(p.y);
        pmin.z = pmin.z.min(p.z);
        pmax.x = pmax.x.max(p.x);
        pmax.y = pmax.y.max(p.y);
        pmax.z = pmax.z.max(p.z);
    }
    (pmin, pmax)
}

/// Axis-aligned rectangle in plan (XY) projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRect {
    pub min: (f64, f64),
    pub max: (f64, f64),
}

impl BoundingRect {
    pub fn from_points(pts: &[Point]) -> Self {
        let (pmin, pmax) = bounding_box(pts);
        Self {
            min: (pmin.x, pmin.y),
            max: (pmax.x, pmax.y),
        }
    }

    /// Smallest rectangle holding both rectangles.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: (self.min.0.min(other.min.0), self.min.1.min(other.min.1)),
            max: (self.max.0.max(other.max.0), self.max.1.max(other.max.1)),
        }
    }

    /// Checks whether two rectangles overlap, using `tolerance` as slack.
    ///
    /// Touching rectangles are overlapping.
    pub fn overlaps(&self, other: &Self, tolerance: f64) -> bool {
        if self.max.0 < other.min.0 - tolerance || self.min.0 > other.max.0 + tolerance {
            return false;
        }
        if self.max.1 < other.min.1 - tolerance || self.min.1 > other.max.1 + tolerance {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let pts = vec![
            Point::new(1., -2., 0.),
            Point::new(-1., 4., 3.),
            Point::new(0., 0., -1.),
        ];
        let (pmin, pmax) = bounding_box(&pts);
        assert!(pmin.is_close(&Point::new(-1., -2., -1.)));
        assert!(pmax.is_close(&Point::new(1., 4., 3.)));
    }

    #[test]
    fn test_rect_overlap_with_tolerance() {
        let a = BoundingRect {
            min: (0., 0.),
            max: (10., 10.),
        };
        let touching = BoundingRect {
            min: (10., 0.),
            max: (20., 10.),
        };
        let near = BoundingRect {
            min: (10.005, 0.),
            max: (20., 10.),
        };
        let far = BoundingRect {
            min: (11., 0.),
            max: (20., 10.),
        };
        assert!(a.overlaps(&touching, 0.));
        assert!(!a.overlaps(&near, 0.));
        assert!(a.overlaps(&near, 0.01));
        assert!(!a.overlaps(&far, 0.01));
    }
}
