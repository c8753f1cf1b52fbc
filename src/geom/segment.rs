//! Line segment operations.
//!
//! 3D distance queries plus the plan-projection (2D) predicates used by the
//! adjacency solver and the segment arrangement.

use crate::geom::EPS;
use crate::geom::point::Point;

/// Result of a 2D segment intersection test.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentIntersection2D {
    /// Segments cross or touch at a single point
    Point((f64, f64)),
    /// Segments are colinear and overlap between the two points
    Colinear((f64, f64), (f64, f64)),
    /// No intersection
    None,
}

/// Calculates the distance between a point and a line segment.
///
/// Returns the minimum distance from the point to any point on the segment.
pub fn distance_point_to_segment(pt: Point, p1: Point, p2: Point) -> f64 {
    let closest = closest_point_on_segment(pt, p1, p2);
    (pt - closest).length()
}

/// Calculates the distance between a point and an infinite line.
///
/// The line is defined by two points p1 and p2.
pub fn distance_point_to_line(pt: Point, p1: Point, p2: Point) -> f64 {
    let line_vec = p2 - p1;
    let pt_vec = pt - p1;

    let line_len_sq = line_vec.dot(&line_vec);

    if line_len_sq < EPS * EPS {
        // Line is a point
        return pt_vec.length();
    }

    // Distance = area / base = |cross| / |line_vec|
    let cross = pt_vec.cross(&line_vec);
    cross.length() / line_len_sq.sqrt()
}

/// Finds the closest point on a segment to a given point.
pub fn closest_point_on_segment(pt: Point, p1: Point, p2: Point) -> Point {
    let seg_vec = p2 - p1;
    let pt_vec = pt - p1;

    let seg_len_sq = seg_vec.dot(&seg_vec);

    if seg_len_sq < EPS * EPS {
        // Segment is a point
        return p1;
    }

    let t = (pt_vec.dot(&seg_vec) / seg_len_sq).clamp(0.0, 1.0);
    p1 + seg_vec * t
}

/// Distance from a plan point to a finite plan segment.
pub fn distance_to_segment_2d(pt: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let (t, _) = project_onto_segment_2d(pt, p1, p2);
    let t = t.clamp(0., 1.);
    let cx = p1.0 + t * (p2.0 - p1.0);
    let cy = p1.1 + t * (p2.1 - p1.1);
    ((pt.0 - cx).powi(2) + (pt.1 - cy).powi(2)).sqrt()
}

/// Parameter of the projection of `pt` onto the line `p1 -> p2`, and the segment length.
///
/// The parameter is 0 at `p1` and 1 at `p2`; it is not clamped.
pub fn project_onto_segment_2d(pt: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> (f64, f64) {
    let dx = p2.0 - p1.0;
    let dy = p2.1 - p1.1;
    let len_sq = dx * dx + dy * dy;
    if len_sq < EPS * EPS {
        return (0., 0.);
    }
    let t = ((pt.0 - p1.0) * dx + (pt.1 - p1.1) * dy) / len_sq;
    (t, len_sq.sqrt())
}

/// Length of a plan segment.
pub fn length_2d(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    ((p2.0 - p1.0).powi(2) + (p2.1 - p1.1).powi(2)).sqrt()
}

/// Checks whether two plan points are within `tol` of each other.
pub fn is_close_2d(a: (f64, f64), b: (f64, f64), tol: f64) -> bool {
    (a.0 - b.0).abs() <= tol && (a.1 - b.1).abs() <= tol
}

/// Checks whether the middle point `b` lies within `tol` of the line `a -> c`.
pub fn is_colinear_2d(a: (f64, f64), b: (f64, f64), c: (f64, f64), tol: f64) -> bool {
    let base = length_2d(a, c);
    if base < EPS {
        return true;
    }
    let cross = (c.0 - a.0) * (b.1 - a.1) - (c.1 - a.1) * (b.0 - a.0);
    (cross / base).abs() <= tol
}

/// Intersects two plan segments.
///
/// `tol` is used both for the parallel test and for the segment extents.
pub fn segment_intersection_2d(
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    p4: (f64, f64),
    tol: f64,
) -> SegmentIntersection2D {
    let d1 = (p2.0 - p1.0, p2.1 - p1.1);
    let d2 = (p4.0 - p3.0, p4.1 - p3.1);
    let len1 = length_2d(p1, p2);
    let len2 = length_2d(p3, p4);
    if len1 < EPS || len2 < EPS {
        return SegmentIntersection2D::None;
    }

    let cross = d1.0 * d2.1 - d1.1 * d2.0;
    let r = (p3.0 - p1.0, p3.1 - p1.1);

    if (cross / (len1 * len2)).abs() < EPS.sqrt() {
        // Parallel: colinear only if p3 is on the line through p1, p2
        let offset = (r.0 * d1.1 - r.1 * d1.0).abs() / len1;
        if offset > tol {
            return SegmentIntersection2D::None;
        }
        let (t3, _) = project_onto_segment_2d(p3, p1, p2);
        let (t4, _) = project_onto_segment_2d(p4, p1, p2);
        let (lo, hi) = if t3 < t4 { (t3, t4) } else { (t4, t3) };
        let start = lo.max(0.);
        let end = hi.min(1.);
        let slack = tol / len1;
        if start > end + slack {
            return SegmentIntersection2D::None;
        }
        let a = (p1.0 + start * d1.0, p1.1 + start * d1.1);
        let b = (p1.0 + end * d1.0, p1.1 + end * d1.1);
        if (end - start) * len1 <= tol {
            return SegmentIntersection2D::Point(a);
        }
        return SegmentIntersection2D::Colinear(a, b);
    }

    let t = (r.0 * d2.1 - r.1 * d2.0) / cross;
    let s = (r.0 * d1.1 - r.1 * d1.0) / cross;
    let slack1 = tol / len1;
    let slack2 = tol / len2;
    if (-slack1..=1. + slack1).contains(&t) && (-slack2..=1. + slack2).contains(&s) {
        SegmentIntersection2D::Point((p1.0 + t * d1.0, p1.1 + t * d1.1))
    } else {
        SegmentIntersection2D::None
    }
}
