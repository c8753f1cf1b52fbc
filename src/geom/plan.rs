//! Plan-projection (XY) loops and polygon booleans.
//!
//! Boolean operations run through `i_overlay`. Loops are plain `(x, y)` tuples:
//! boundaries are counter-clockwise and holes clockwise.

use crate::geom::EPS;
use crate::geom::segment::{
    SegmentIntersection2D, distance_to_segment_2d, is_close_2d, project_onto_segment_2d,
    segment_intersection_2d,
};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

pub type Point2 = (f64, f64);

/// A plan region: one counter-clockwise boundary and clockwise holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanShape {
    pub boundary: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

impl PlanShape {
    /// Creates a shape and normalizes loop orientation.
    pub fn new(boundary: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self {
            boundary: ensure_ccw(&boundary),
            holes: holes.iter().map(|h| ensure_cw(h)).collect(),
        }
    }

    /// Net area (boundary minus holes).
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.boundary).abs() - holes
    }

    /// Point-in-region test (points on an edge count as outside).
    pub fn contains(&self, pt: Point2) -> bool {
        is_point_in_loop(pt, &self.boundary) && !self.holes.iter().any(|h| is_point_in_loop(pt, h))
    }

    /// All loops, boundary first.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<Point2>> {
        std::iter::once(&self.boundary).chain(self.holes.iter())
    }

    /// Largest extent of the bounding rectangle.
    pub fn max_dimension(&self) -> f64 {
        let (mut xmin, mut ymin) = (f64::INFINITY, f64::INFINITY);
        let (mut xmax, mut ymax) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in &self.boundary {
            xmin = xmin.min(x);
            ymin = ymin.min(y);
            xmax = xmax.max(x);
            ymax = ymax.max(y);
        }
        if self.boundary.is_empty() {
            return 0.;
        }
        (xmax - xmin).max(ymax - ymin)
    }

    /// Checks that no loop self-intersects and loops do not cross each other.
    pub fn is_valid(&self, tol: f64) -> bool {
        if self.boundary.len() < 3 || self.area() <= EPS {
            return false;
        }
        let loops: Vec<&Vec<Point2>> = self.loops().collect();
        if loops.iter().any(|l| is_self_intersecting(l, tol)) {
            return false;
        }
        for (i, a) in loops.iter().enumerate() {
            for b in loops.iter().skip(i + 1) {
                if loops_cross(a, b, tol) {
                    return false;
                }
            }
        }
        self.holes
            .iter()
            .all(|h| h.iter().all(|&p| is_inside_or_on(p, &self.boundary, tol)))
    }
}

/// Signed area (positive for counter-clockwise loops).
pub fn signed_area(pts: &[Point2]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.;
    }
    let mut sum = 0.;
    for i in 0..n {
        let (x1, y1) = pts[i];
        let (x2, y2) = pts[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.
}

pub fn is_ccw(pts: &[Point2]) -> bool {
    signed_area(pts) > 0.
}

/// Reverses a loop keeping its first vertex, so edge `k` maps to edge `n - 1 - k`.
pub fn reverse_loop<T: Copy>(pts: &[T]) -> Vec<T> {
    if pts.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(pts.len());
    out.push(pts[0]);
    out.extend(pts[1..].iter().rev());
    out
}

pub fn ensure_ccw(pts: &[Point2]) -> Vec<Point2> {
    if is_ccw(pts) { pts.to_vec() } else { reverse_loop(pts) }
}

pub fn ensure_cw(pts: &[Point2]) -> Vec<Point2> {
    if is_ccw(pts) { reverse_loop(pts) } else { pts.to_vec() }
}

/// Even-odd ray casting test.
pub fn is_point_in_loop(pt: Point2, pts: &[Point2]) -> bool {
    let n = pts.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (xi, yi) = pts[i];
        let (xj, yj) = pts[j];
        if (yi > pt.1) != (yj > pt.1) {
            let x_cross = xj + (pt.1 - yj) * (xi - xj) / (yi - yj);
            if pt.0 < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Checks whether the point lies within `tol` of any loop edge.
pub fn is_point_on_loop(pt: Point2, pts: &[Point2], tol: f64) -> bool {
    let n = pts.len();
    (0..n).any(|i| distance_to_segment_2d(pt, pts[i], pts[(i + 1) % n]) <= tol)
}

fn is_inside_or_on(pt: Point2, pts: &[Point2], tol: f64) -> bool {
    is_point_in_loop(pt, pts) || is_point_on_loop(pt, pts, tol)
}

/// Checks whether any two non-neighbouring edges of the loop touch.
pub fn is_self_intersecting(pts: &[Point2], tol: f64) -> bool {
    let n = pts.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (pts[i], pts[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (pts[j], pts[(j + 1) % n]);
            if segment_intersection_2d(a1, a2, b1, b2, tol) != SegmentIntersection2D::None {
                return true;
            }
        }
    }
    false
}

/// Checks whether edges of two loops properly cross (touching is allowed).
fn loops_cross(a: &[Point2], b: &[Point2], tol: f64) -> bool {
    let (n, m) = (a.len(), b.len());
    for i in 0..n {
        let (a1, a2) = (a[i], a[(i + 1) % n]);
        for j in 0..m {
            let (b1, b2) = (b[j], b[(j + 1) % m]);
            if let SegmentIntersection2D::Point(p) = segment_intersection_2d(a1, a2, b1, b2, tol) {
                let at_end = [a1, a2, b1, b2].iter().any(|&q| is_close_2d(p, q, tol));
                if !at_end {
                    return true;
                }
            }
        }
    }
    false
}

/// Unions plan shapes into the minimal set of shapes with holes.
pub fn union(shapes: &[PlanShape]) -> Vec<PlanShape> {
    let Some((first, rest)) = shapes.split_first() else {
        return Vec::new();
    };
    let subject = to_paths(first);
    let clip: Vec<Vec<[f64; 2]>> = rest.iter().flat_map(to_paths).collect();
    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    from_overlay(result)
}

/// Region common to both shapes.
pub fn intersection(a: &PlanShape, b: &PlanShape) -> Vec<PlanShape> {
    let result = to_paths(a).overlay(&to_paths(b), OverlayRule::Intersect, FillRule::NonZero);
    from_overlay(result)
}

/// Region of `a` outside of any of the `clips`.
pub fn difference(a: &PlanShape, clips: &[PlanShape]) -> Vec<PlanShape> {
    if clips.is_empty() {
        return vec![a.clone()];
    }
    let clip: Vec<Vec<[f64; 2]>> = clips.iter().flat_map(to_paths).collect();
    let result = to_paths(a).overlay(&clip, OverlayRule::Difference, FillRule::NonZero);
    from_overlay(result)
}

/// Resolves a possibly self-intersecting loop set into valid shapes.
pub fn repair(shape: &PlanShape) -> Vec<PlanShape> {
    let empty: Vec<Vec<[f64; 2]>> = Vec::new();
    let result = to_paths(shape).overlay(&empty, OverlayRule::Union, FillRule::EvenOdd);
    from_overlay(result)
}

fn to_paths(shape: &PlanShape) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + shape.holes.len());
    paths.push(ensure_ccw(&shape.boundary).iter().map(|p| [p.0, p.1]).collect());
    for hole in &shape.holes {
        paths.push(ensure_cw(hole).iter().map(|p| [p.0, p.1]).collect());
    }
    paths
}

/// Shapes -> contours -> points; the first contour of a shape is its boundary.
fn from_overlay(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<PlanShape> {
    shapes
        .into_iter()
        .filter_map(|mut contours| {
            if contours.is_empty() {
                return None;
            }
            let boundary: Vec<Point2> = contours.remove(0).into_iter().map(|p| (p[0], p[1])).collect();
            if boundary.len() < 3 {
                return None;
            }
            let holes: Vec<Vec<Point2>> = contours
                .into_iter()
                .map(|c| c.into_iter().map(|p| (p[0], p[1])).collect::<Vec<Point2>>())
                .filter(|c| c.len() >= 3)
                .collect();
            Some(PlanShape::new(boundary, holes))
        })
        .filter(|s| s.area() > EPS)
        .collect()
}

/// Inserts the vertices and crossing points of other loops into each loop.
///
/// Loops sharing the same `owner` are never intersected with each other.
/// The result has the same loop count and order as the input.
pub fn intersect_loop_segments(loops: &[Vec<Point2>], owners: &[usize], tol: f64) -> Vec<Vec<Point2>> {
    let mut result = loops.to_vec();
    for i in 0..result.len() {
        for j in 0..result.len() {
            if i == j || owners.get(i) == owners.get(j) {
                continue;
            }
            let other = result[j].clone();
            result[i] = insert_points_from(&result[i], &other, tol);
        }
    }
    result
}

fn insert_points_from(pts: &[Point2], other: &[Point2], tol: f64) -> Vec<Point2> {
    let n = pts.len();
    let m = other.len();
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let a = pts[k];
        let b = pts[(k + 1) % n];
        out.push(a);

        let mut extra: Vec<(f64, Point2)> = Vec::new();
        for &q in other {
            if distance_to_segment_2d(q, a, b) <= tol && !is_close_2d(q, a, tol) && !is_close_2d(q, b, tol) {
                let (t, _) = project_onto_segment_2d(q, a, b);
                extra.push((t, q));
            }
        }
        for l in 0..m {
            let (c, d) = (other[l], other[(l + 1) % m]);
            if let SegmentIntersection2D::Point(x) = segment_intersection_2d(a, b, c, d, tol)
                && !is_close_2d(x, a, tol)
                && !is_close_2d(x, b, tol)
            {
                let (t, _) = project_onto_segment_2d(x, a, b);
                if t > 0. && t < 1. {
                    extra.push((t, x));
                }
            }
        }
        extra.sort_by(|p, q| p.0.total_cmp(&q.0));
        let mut last = a;
        for (_, p) in extra {
            if !is_close_2d(p, last, tol) {
                out.push(p);
                last = p;
            }
        }
    }
    out
}
