//! Closed polyhedral solids built from planar polygons.

use crate::geom::EPS;
use crate::geom::point::Point;
use crate::geom::polygon::{Polygon, area_vector};
use crate::geom::vector::Vector;
use anyhow::{Result, anyhow};

#[derive(Debug, Clone)]
pub struct Solid {
    polygons: Vec<Polygon>,
}

impl Solid {
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Extrudes an upward-facing polygon by `height`.
    ///
    /// The polygons are ordered: floor (facing down), one wall per edge in
    /// `Polygon::edges()` order, ceiling (facing up).
    pub fn from_offset_face(base: &Polygon, height: f64) -> Result<Self> {
        if height <= EPS {
            return Err(anyhow!("Extrusion height must be positive, got {height}"));
        }
        if base.normal().dz <= 0. {
            return Err(anyhow!("Extruded face must point up"));
        }
        let up = Vector::new(0., 0., height);
        let mut polygons = Vec::with_capacity(base.edge_count() + 2);
        polygons.push(base.flip());
        for (p1, p2) in base.edges() {
            polygons.push(wall_polygon(p1, p2, 0., height)?);
        }
        polygons.push(base.translate(&up));
        Ok(Self { polygons })
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    /// Sum of the area vectors of all faces (zero for a closed surface).
    pub fn area_vector_sum(&self) -> Vector {
        self.polygons
            .iter()
            .fold(Vector::new(0., 0., 0.), |acc, p| acc + area_vector(p))
    }

    pub fn surface_area(&self) -> f64 {
        self.polygons.iter().map(|p| p.area()).sum()
    }

    /// Volume from the divergence theorem (positive for outward normals).
    pub fn volume(&self) -> f64 {
        let sum: f64 = self
            .polygons
            .iter()
            .map(|p| Vector::from_a_point(p.vertices()[0]).dot(&p.normal()) * p.area())
            .sum();
        sum / 3.
    }

    /// Checks closure (area vectors cancel) and a positive volume.
    pub fn is_closed(&self, tol: f64) -> bool {
        if self.polygons.len() < 4 {
            return false;
        }
        let residual = self.area_vector_sum().length();
        let scale = self.surface_area().sqrt().max(1.);
        residual <= tol * scale && self.volume() > EPS
    }
}

/// Vertical rectangle standing on `p1 -> p2`, from `z0` to `z1` above the segment.
///
/// Vertex order is bottom-start, bottom-end, top-end, top-start, so the
/// normal lies on the right-hand side of the segment in plan.
pub fn wall_polygon(p1: Point, p2: Point, z0: f64, z1: f64) -> Result<Polygon> {
    let lo = Vector::new(0., 0., z0);
    let hi = Vector::new(0., 0., z1);
    Polygon::new(vec![p1 + lo, p2 + lo, p2 + hi, p1 + hi], None)
}
