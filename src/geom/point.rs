use crate::geom::EPS;
use crate::geom::vector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns true if both points are very close to each other.
    pub fn is_close(&self, other: &Self) -> bool {
        self.is_close_tol(other, EPS)
    }

    /// Returns true if all coordinates differ by at most `tol`.
    pub fn is_close_tol(&self, other: &Self, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*other - *self).length()
    }

    /// Plan projection of the point.
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Multiplies all coordinates by a scalar and returns a copy.
    pub fn scale(&self, scale: f64) -> Self {
        Self {
            x: self.x * scale,
            y: self.y * scale,
            z: self.z * scale,
        }
    }

    /// Scales the point away from `origin`.
    pub fn scale_from(&self, factor: f64, origin: Point) -> Self {
        origin + (*self - origin) * factor
    }

    /// Rotates the point counterclockwise in the XY plane around `origin`.
    ///
    /// `angle` is in radians.
    pub fn rotate_xy(&self, angle: f64, origin: Point) -> Self {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        Self::new(
            origin.x + dx * cos - dy * sin,
            origin.y + dx * sin + dy * cos,
            self.z,
        )
    }

    /// Reflects the point across the plane through `origin` with normal `normal`.
    pub fn reflect(&self, normal: &Vector, origin: Point) -> Self {
        let n = normal.normalize().unwrap_or(*normal);
        let d = (*self - origin).dot(&n);
        *self + n * (-2. * d)
    }

    /// Checks if the point lies on the segment `p1 -> p2`.
    pub fn is_on_segment(&self, p1: Point, p2: Point) -> bool {
        crate::geom::segment::distance_point_to_segment(*self, p1, p2) < EPS
    }

    // Creates a new point along the edge pt1->pt2 with some relative distance from pt1.
    pub fn new_between_2_points(pt1: Self, pt2: Self, rel_d: f64) -> Self {
        pt1 + (pt2 - pt1) * rel_d
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Point({:.prec$}, {:.prec$}, {:.prec$})",
            self.x,
            self.y,
            self.z,
            prec = prec
        )
    }
}

impl Add<Vector> for Point {
    type Output = Point;
    fn add(self, other: Vector) -> Self {
        Self {
            x: self.x + other.dx,
            y: self.y + other.dy,
            z: self.z + other.dz,
        }
    }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, other: Self) -> Vector {
        Vector::from_points(other, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_is_close() {
        let pa = Point::new(5., 5., 5.);
        let pb = Point::new(5.00000000000001, 5., 5.);
        let pc = Point::new(5.0001, 5., 5.);
        assert!(pa.is_close(&pb));
        assert!(!pa.is_close(&pc));
        assert!(pa.is_close_tol(&pc, 0.01));
    }

    #[test]
    fn test_new_between_2_points() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(1., 1., 1.);
        let ptest = Point::new_between_2_points(p0, p1, 0.5);
        assert!(ptest.is_close(&Point::new(0.5, 0.5, 0.5)));
        let ptest = Point::new_between_2_points(p0, p0, 1.0);
        assert!(ptest.is_close(&p0));
    }

    #[test]
    fn test_rotate_xy() {
        let p = Point::new(1., 0., 3.);
        let r = p.rotate_xy(PI / 2., Point::new(0., 0., 0.));
        assert!(r.is_close_tol(&Point::new(0., 1., 3.), 1e-9));
    }

    #[test]
    fn test_reflect() {
        let p = Point::new(2., 1., 0.);
        let r = p.reflect(&Vector::new(1., 0., 0.), Point::new(0., 0., 0.));
        assert!(r.is_close(&Point::new(-2., 1., 0.)));
    }

    #[test]
    fn test_scale_from() {
        let p = Point::new(2., 2., 2.);
        let s = p.scale_from(2., Point::new(1., 1., 1.));
        assert!(s.is_close(&Point::new(3., 3., 3.)));
    }
}
