//! Planar polygon with optional holes.
//!
//! The boundary and each hole are stored as open vertex loops (the closing
//! edge is implicit). Holes run opposite to the boundary, so the Newell normal
//! of the whole polygon is the boundary normal.

use crate::geom::EPS;
use crate::geom::bboxes::bounding_box;
use crate::geom::plan::{PlanShape, Point2};
use crate::geom::point::Point;
use crate::geom::vector::Vector;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    boundary: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    holes: Vec<Vec<Point>>,
    vn: Vector,
}

impl Polygon {
    /// Creates a polygon without holes.
    ///
    /// If `normal` is given, the vertex order is checked against it.
    pub fn new(pts: Vec<Point>, normal: Option<Vector>) -> Result<Self> {
        Self::with_holes(pts, Vec::new(), normal)
    }

    /// Creates a polygon with holes. Hole orientation is made opposite to the boundary.
    pub fn with_holes(pts: Vec<Point>, holes: Vec<Vec<Point>>, normal: Option<Vector>) -> Result<Self> {
        if pts.len() < 3 {
            return Err(anyhow!("Polygon needs at least 3 vertices, got {}", pts.len()));
        }
        let area_vec = newell(&pts);
        let vn = area_vec
            .normalize()
            .map_err(|_| anyhow!("Polygon has zero area (collinear or duplicate vertices)"))?;
        if let Some(expected) = normal {
            let expected = expected.normalize()?;
            if vn.dot(&expected) < 0. {
                return Err(anyhow!("Polygon vertex order does not match the given normal"));
            }
        }

        let mut oriented_holes = Vec::with_capacity(holes.len());
        for hole in holes {
            if hole.len() < 3 {
                return Err(anyhow!("Polygon hole needs at least 3 vertices, got {}", hole.len()));
            }
            if newell(&hole).dot(&vn) > 0. {
                oriented_holes.push(reverse_keep_first(&hole));
            } else {
                oriented_holes.push(hole);
            }
        }

        Ok(Self {
            boundary: pts,
            holes: oriented_holes,
            vn,
        })
    }

    /// Lifts a plan shape to elevation `z` (normal pointing up).
    pub fn from_plan(shape: &PlanShape, z: f64) -> Result<Self> {
        let lift = |l: &Vec<Point2>| l.iter().map(|&(x, y)| Point::new(x, y, z)).collect::<Vec<_>>();
        Self::with_holes(
            lift(&shape.boundary),
            shape.holes.iter().map(lift).collect(),
            Some(Vector::up()),
        )
    }

    /// Plan projection of the polygon.
    pub fn to_plan(&self) -> PlanShape {
        let flat = |l: &Vec<Point>| l.iter().map(|p| p.xy()).collect::<Vec<_>>();
        PlanShape::new(flat(&self.boundary), self.holes.iter().map(flat).collect())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.boundary
    }

    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Unit normal.
    pub fn normal(&self) -> Vector {
        self.vn
    }

    /// All loops, boundary first.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.boundary).chain(self.holes.iter())
    }

    /// Edges of the boundary followed by the edges of each hole.
    pub fn edges(&self) -> Vec<(Point, Point)> {
        let mut edges = Vec::new();
        for lp in self.loops() {
            let n = lp.len();
            for i in 0..n {
                edges.push((lp[i], lp[(i + 1) % n]));
            }
        }
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.loops().map(|l| l.len()).sum()
    }

    /// Net area (boundary minus holes).
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| newell(h).length()).sum();
        newell(&self.boundary).length() - holes
    }

    /// Area-weighted centroid.
    pub fn centroid(&self) -> Point {
        let (mut cx, mut cy, mut cz, mut total) = (0., 0., 0., 0.);
        for (k, lp) in self.loops().enumerate() {
            let sign = if k == 0 { 1. } else { -1. };
            let p0 = lp[0];
            for i in 1..lp.len().saturating_sub(1) {
                let (a, b) = (lp[i], lp[i + 1]);
                let tri = (a - p0).cross(&(b - p0)).length() / 2. * sign;
                cx += tri * (p0.x + a.x + b.x) / 3.;
                cy += tri * (p0.y + a.y + b.y) / 3.;
                cz += tri * (p0.z + a.z + b.z) / 3.;
                total += tri;
            }
        }
        if total.abs() < EPS {
            return self.boundary[0];
        }
        Point::new(cx / total, cy / total, cz / total)
    }

    /// Signed distance from the polygon plane.
    pub fn distance_to_plane(&self, pt: Point) -> f64 {
        (pt - self.boundary[0]).dot(&self.vn)
    }

    /// Flips the polygon (reversed loops keep their first vertex).
    pub fn flip(&self) -> Self {
        Self {
            boundary: reverse_keep_first(&self.boundary),
            holes: self.holes.iter().map(|h| reverse_keep_first(h)).collect(),
            vn: -self.vn,
        }
    }

    /// Applies `f` to every vertex and recomputes the normal.
    pub fn map_points<F: Fn(Point) -> Point>(&self, f: F) -> Result<Self> {
        let boundary: Vec<Point> = self.boundary.iter().map(|&p| f(p)).collect();
        let holes: Vec<Vec<Point>> = self.holes.iter().map(|h| h.iter().map(|&p| f(p)).collect()).collect();
        let vn = newell(&boundary).normalize()?;
        Ok(Self { boundary, holes, vn })
    }

    pub fn translate(&self, vec: &Vector) -> Self {
        Self {
            boundary: self.boundary.iter().map(|&p| p + *vec).collect(),
            holes: self.holes.iter().map(|h| h.iter().map(|&p| p + *vec).collect()).collect(),
            vn: self.vn,
        }
    }

    /// Rotates counterclockwise in the XY plane. `angle` is in radians.
    pub fn rotate_xy(&self, angle: f64, origin: Point) -> Result<Self> {
        self.map_points(|p| p.rotate_xy(angle, origin))
    }

    /// Scales from `origin`.
    pub fn scale(&self, factor: f64, origin: Point) -> Result<Self> {
        if factor.abs() < EPS {
            return Err(anyhow!("Scale factor must not be zero"));
        }
        self.map_points(|p| p.scale_from(factor, origin))
    }

    /// Reflects across a plane. The vertex order is kept, so the normal flips.
    pub fn reflect(&self, normal: &Vector, origin: Point) -> Result<Self> {
        self.map_points(|p| p.reflect(normal, origin))
    }

    /// Checks if a point lies inside the polygon (and within `EPS` of its plane).
    pub fn is_point_inside(&self, pt: Point) -> bool {
        if self.distance_to_plane(pt).abs() > EPS.sqrt() {
            return false;
        }
        let Some(basis) = crate::geom::projection::PlaneBasis::from_normal(self.boundary[0], self.vn) else {
            return false;
        };
        let local = |l: &Vec<Point>| l.iter().map(|&p| basis.project(p)).collect::<Vec<_>>();
        let shape = PlanShape::new(local(&self.boundary), self.holes.iter().map(local).collect());
        shape.contains(basis.project(pt))
    }

    /// Returns the bounding box as (min_point, max_point).
    pub fn bbox(&self) -> (Point, Point) {
        bounding_box(&self.boundary)
    }
}

/// Newell area vector of a single loop.
fn newell(pts: &[Point]) -> Vector {
    let n = pts.len();
    let (mut nx, mut ny, mut nz) = (0., 0., 0.);
    for i in 0..n {
        let c = pts[i];
        let nx_pt = pts[(i + 1) % n];
        nx += (c.y - nx_pt.y) * (c.z + nx_pt.z);
        ny += (c.z - nx_pt.z) * (c.x + nx_pt.x);
        nz += (c.x - nx_pt.x) * (c.y + nx_pt.y);
    }
    Vector::new(nx / 2., ny / 2., nz / 2.)
}

/// Area vector of a polygon: unit normal times net area.
pub fn area_vector(polygon: &Polygon) -> Vector {
    polygon.normal() * polygon.area()
}

fn reverse_keep_first(pts: &[Point]) -> Vec<Point> {
    crate::geom::plan::reverse_loop(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    fn square(z: f64) -> Polygon {
        let pts = vec![
            Point::new(0., 0., z),
            Point::new(2., 0., z),
            Point::new(2., 2., z),
            Point::new(0., 2., z),
        ];
        Polygon::new(pts, None).unwrap()
    }

    #[test]
    fn test_normal_and_area() {
        let poly = square(1.);
        assert!(poly.normal().is_close(&Vector::up()));
        assert!(poly.area().is_close(4.));
        assert!(poly.centroid().is_close(&Point::new(1., 1., 1.)));
    }

    #[test]
    fn test_rejects_wrong_normal_and_degenerate() {
        let pts = vec![
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(1., 1., 0.),
        ];
        assert!(Polygon::new(pts.clone(), Some(Vector::new(0., 0., -1.))).is_err());
        let line = vec![
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(2., 0., 0.),
        ];
        assert!(Polygon::new(line, None).is_err());
    }

    #[test]
    fn test_holes_are_reoriented() {
        let outer = square(0.).vertices().to_vec();
        let hole = vec![
            Point::new(0.5, 0.5, 0.),
            Point::new(1.5, 0.5, 0.),
            Point::new(1.5, 1.5, 0.),
            Point::new(0.5, 1.5, 0.),
        ];
        let poly = Polygon::with_holes(outer, vec![hole], None).unwrap();
        assert!(poly.area().is_close(3.));
        assert_eq!(poly.edge_count(), 8);
        assert!(poly.holes()[0][0].is_close(&Point::new(0.5, 0.5, 0.)));
        assert!(!poly.is_point_inside(Point::new(1., 1., 0.)));
        assert!(poly.is_point_inside(Point::new(0.25, 1., 0.)));
    }

    #[test]
    fn test_flip_keeps_first_vertex() {
        let poly = square(0.);
        let flipped = poly.flip();
        assert!(flipped.normal().is_close(&Vector::new(0., 0., -1.)));
        assert_eq!(flipped.vertices()[0], poly.vertices()[0]);
        assert_eq!(flipped.vertices()[1], poly.vertices()[3]);
    }

    #[test]
    fn test_reflect_flips_normal() {
        let poly = square(0.);
        let reflected = poly.reflect(&Vector::new(1., 0., 0.), Point::new(0., 0., 0.)).unwrap();
        assert!(reflected.normal().is_close(&Vector::new(0., 0., -1.)));
        assert!(reflected.area().is_close(4.));
    }
}
