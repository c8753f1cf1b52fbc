use crate::geom::point::Point;
use crate::geom::vector::Vector;

/// Orthonormal basis for projecting 3D points onto a 2D plane and back.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    pub origin: Point,
    pub u: Vector,
    pub v: Vector,
}

impl PlaneBasis {
    /// Creates a `PlaneBasis` from an origin point and a normal vector.
    ///
    /// For vertical planes `u` is horizontal and `v` points up.
    pub fn from_normal(origin: Point, normal: Vector) -> Option<Self> {
        let n = normal.normalize().ok()?;
        let helper = if n.dz.abs() < 0.9 {
            Vector::up()
        } else {
            Vector::new(0.0, 1.0, 0.0)
        };

        let u = helper.cross(&n).normalize().ok()?;
        let v = n.cross(&u).normalize().ok()?;

        Some(Self { origin, u, v })
    }

    /// Wall-local frame of the vertical wall standing on `start -> end`.
    ///
    /// `u` runs from `start` to `end`, `v` points up, and the wall's outward
    /// normal is on the right-hand side of the segment in plan.
    pub fn for_wall(start: Point, end: Point) -> Option<Self> {
        let dir = end - start;
        let normal = Vector::new(dir.dy, -dir.dx, 0.);
        Self::from_normal(start, normal)
    }

    /// Outward normal of the plane (`u x v`).
    pub fn normal(&self) -> Vector {
        self.u.cross(&self.v)
    }

    /// Projects a 3D point onto the 2D plane, returning (u, v) coordinates.
    pub fn project(&self, p: Point) -> (f64, f64) {
        let r = p - self.origin;
        (r.dot(&self.u), r.dot(&self.v))
    }

    /// Unprojects 2D (u, v) coordinates back to a 3D point on the plane.
    pub fn unproject(&self, x: f64, y: f64) -> Point {
        self.origin + self.u * x + self.v * y
    }
}
