//! Solid 3D rooms produced by extruding Room2Ds.
//!
//! A [`Room3D`] is a closed set of [`Face`]s. Faces carry their own boundary
//! condition plus the apertures and shades generated from the window and
//! shading parameters of the floor plate they came from.

use crate::geom::plan::Point2;
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::projection::PlaneBasis;
use crate::geom::solid::Solid;
use crate::name::HasName;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceType {
    Floor,
    Wall,
    RoofCeiling,
    AirBoundary,
}

/// Boundary condition of a 3D face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FaceBoundary {
    #[default]
    Outdoors,
    Ground,
    Adiabatic,
    /// Adjacent face `face` of room `room`.
    Surface { face: String, room: String },
}

impl FaceBoundary {
    pub fn surface(face: &str, room: &str) -> Self {
        Self::Surface {
            face: face.to_string(),
            room: room.to_string(),
        }
    }

    pub fn is_outdoors(&self) -> bool {
        matches!(self, Self::Outdoors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aperture {
    pub identifier: String,
    pub polygon: Polygon,
}

impl Aperture {
    /// Lifts a wall-local `(u, v)` polygon into 3D using the wall frame.
    pub fn from_wall_local(identifier: &str, basis: &PlaneBasis, pts: &[Point2]) -> Result<Self> {
        let pts: Vec<Point> = pts.iter().map(|&(u, v)| basis.unproject(u, v)).collect();
        Ok(Self {
            identifier: identifier.to_string(),
            polygon: Polygon::new(pts, Some(basis.normal()))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shade {
    pub identifier: String,
    pub polygon: Polygon,
}

/// Wall-local frame of a rectangular wall face.
#[derive(Debug, Clone, Copy)]
pub struct WallFrame {
    pub basis: PlaneBasis,
    pub length: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub identifier: String,
    pub polygon: Polygon,
    pub face_type: FaceType,
    pub boundary_condition: FaceBoundary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apertures: Vec<Aperture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shades: Vec<Shade>,
}

impl HasName for Face {
    fn get_name(&self) -> &str {
        &self.identifier
    }
}

impl Face {
    pub fn new(identifier: &str, polygon: Polygon, face_type: FaceType, boundary_condition: FaceBoundary) -> Self {
        Self {
            identifier: identifier.to_string(),
            polygon,
            face_type,
            boundary_condition,
            apertures: Vec::new(),
            shades: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    pub fn aperture_area(&self) -> f64 {
        self.apertures.iter().map(|a| a.polygon.area()).sum()
    }

    pub fn is_wall(&self) -> bool {
        matches!(self.face_type, FaceType::Wall | FaceType::AirBoundary)
    }

    /// Frame of a wall whose first edge is its bottom edge (see `solid::wall_polygon`).
    ///
    /// Returns `None` for non-vertical faces.
    pub fn wall_frame(&self) -> Option<WallFrame> {
        if !self.is_wall() || self.polygon.normal().dz.abs() > 1e-6 {
            return None;
        }
        let pts = self.polygon.vertices();
        let (start, end) = (pts[0], pts[1]);
        let basis = PlaneBasis::for_wall(start, end)?;
        let length = start.distance(&end);
        let (zmin, zmax) = pts
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.z), hi.max(p.z)));
        Some(WallFrame {
            basis,
            length,
            height: zmax - zmin,
        })
    }
}

/// A closed room volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room3D {
    pub identifier: String,
    pub faces: Vec<Face>,
    pub multiplier: usize,
    #[serde(default)]
    pub is_plenum: bool,
}

impl HasName for Room3D {
    fn get_name(&self) -> &str {
        &self.identifier
    }
}

impl Room3D {
    pub fn new(identifier: &str, faces: Vec<Face>, multiplier: usize) -> Self {
        Self {
            identifier: identifier.to_string(),
            faces,
            multiplier: multiplier.max(1),
            is_plenum: false,
        }
    }

    pub fn face_by_identifier(&self, identifier: &str) -> Option<&Face> {
        self.faces.iter().find(|f| f.identifier == identifier)
    }

    pub fn face_by_identifier_mut(&mut self, identifier: &str) -> Option<&mut Face> {
        self.faces.iter_mut().find(|f| f.identifier == identifier)
    }

    pub fn walls(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(|f| f.is_wall())
    }

    pub fn volume(&self) -> f64 {
        self.solid().volume()
    }

    pub fn floor_area(&self) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.face_type == FaceType::Floor)
            .map(|f| f.area())
            .sum()
    }

    /// Area of walls with an Outdoors boundary condition.
    pub fn exterior_wall_area(&self) -> f64 {
        self.walls()
            .filter(|f| f.boundary_condition.is_outdoors())
            .map(|f| f.area())
            .sum()
    }

    /// Area of apertures on walls with an Outdoors boundary condition.
    pub fn exterior_aperture_area(&self) -> f64 {
        self.walls()
            .filter(|f| f.boundary_condition.is_outdoors())
            .map(|f| f.aperture_area())
            .sum()
    }

    /// Checks that the faces form a closed volume.
    pub fn check_solid(&self, tol: f64) -> bool {
        self.solid().is_closed(tol)
    }

    fn solid(&self) -> Solid {
        Solid::from_polygons(self.faces.iter().map(|f| f.polygon.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;
    use crate::geom::solid::wall_polygon;

    fn box_room() -> Room3D {
        let base = Polygon::new(
            vec![
                Point::new(0., 0., 0.),
                Point::new(4., 0., 0.),
                Point::new(4., 5., 0.),
                Point::new(0., 5., 0.),
            ],
            None,
        )
        .unwrap();
        let solid = Solid::from_offset_face(&base, 3.).unwrap();
        let n = solid.polygons().len();
        let faces = solid
            .into_polygons()
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let face_type = if i == 0 {
                    FaceType::Floor
                } else if i == n - 1 {
                    FaceType::RoofCeiling
                } else {
                    FaceType::Wall
                };
                Face::new(&format!("Box..Face{i}"), p, face_type, FaceBoundary::Outdoors)
            })
            .collect();
        Room3D::new("Box", faces, 1)
    }

    #[test]
    fn test_room_measures() {
        let mut room = box_room();
        assert!(room.volume().is_close(60.));
        assert!(room.floor_area().is_close(20.));
        assert!(room.exterior_wall_area().is_close(54.));
        assert!(room.check_solid(0.01));

        room.face_by_identifier_mut("Box..Face1").unwrap().boundary_condition = FaceBoundary::Adiabatic;
        assert!(room.exterior_wall_area().is_close(42.));
    }

    #[test]
    fn test_wall_frame() {
        let poly = wall_polygon(Point::new(0., 0., 1.), Point::new(6., 0., 1.), 0., 2.5).unwrap();
        let face = Face::new("W", poly, FaceType::Wall, FaceBoundary::Outdoors);
        let frame = face.wall_frame().unwrap();
        assert!(frame.length.is_close(6.));
        assert!(frame.height.is_close(2.5));
        // Outward normal of a wall running +x is -y
        assert!(frame.basis.normal().dy.is_close(-1.));

        let aperture = Aperture::from_wall_local("A", &frame.basis, &[(1., 1.), (2., 1.), (2., 2.), (1., 2.)]).unwrap();
        assert!(aperture.polygon.area().is_close(1.));
        assert!(aperture.polygon.normal().dy.is_close(-1.));
    }

    #[test]
    fn test_face_boundary_serde() {
        let bc = FaceBoundary::surface("B..Face2", "B");
        let json = serde_json::to_string(&bc).unwrap();
        assert_eq!(json, r#"{"type":"Surface","face":"B..Face2","room":"B"}"#);
    }
}
