//! Extrusion of Room2Ds into solid rooms.
//!
//! A Room2D becomes a [`Room3D`] with faces in a fixed order: floor
//! (`..Face0`), one wall per segment (`..Face1` to `..Face<n>`) and the ceiling
//! (`..Face<n+1>`). Walls facing a neighbor of different height are split into
//! stacked strips so the shared part has the same area on both sides. Surface
//! walls are returned as [`DeferredAdjacency`] records that the Story checks
//! once all its rooms exist.

use crate::boundary::{BoundaryCondition, face_identifier, wall_face_identifier};
use crate::config::ConversionConfig;
use crate::error::{Error, Result};
use crate::geom::plan;
use crate::geom::polygon::Polygon;
use crate::geom::solid::{Solid, wall_polygon};
use crate::geom::vector::Vector;
use crate::name::FindByName;
use crate::room2d::Room2D;
use crate::room2d::split::shape_edges;
use crate::room2d::transplant::{Transplant, transplant_segments};
use crate::room3d::{Face, FaceBoundary, FaceType, Room3D};
use crate::story::Story;
use log::warn;

/// How the solid of a room was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtrusionOutcome {
    /// The floor plate extruded into a valid closed solid.
    Solid,
    /// The floor plate was repaired before extrusion; wall splitting was skipped.
    ForcedSolid { reason: String },
    /// Diagnostic mode: the invalid extrusion is returned as-is.
    Invalid { reason: String },
}

/// A Surface wall whose partner face lives in another room.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredAdjacency {
    /// Wall face of the extruded room.
    pub face: String,
    pub target_face: String,
    pub target_room: String,
}

#[derive(Debug, Clone)]
pub struct Extrusion {
    pub room: Room3D,
    pub plenums: Vec<Room3D>,
    pub deferred: Vec<DeferredAdjacency>,
    pub outcome: ExtrusionOutcome,
}

/// Extrudes `room` in the context of its Story.
///
/// Without a Story there is no wall splitting and no plenums. Geometry
/// failures are reported as [`Error::Extrusion`] for this room only.
pub fn extrude_room(
    room: &Room2D,
    story: Option<&Story>,
    multiplier: usize,
    config: &ConversionConfig,
) -> Result<Extrusion> {
    let tol = config.tolerance.distance;
    let fail = |reason: String| Error::Extrusion {
        room: room.identifier().to_string(),
        reason,
    };

    let (source, solid, outcome) = match check_extrusion(room, tol) {
        Ok(solid) => (room.clone(), solid, ExtrusionOutcome::Solid),
        Err(reason) if config.diagnostic => {
            let solid = Solid::from_offset_face(room.floor_geometry(), room.floor_to_ceiling_height())
                .map_err(|e| fail(format!("{reason}; {e}")))?;
            (room.clone(), solid, ExtrusionOutcome::Invalid { reason })
        }
        Err(reason) => {
            warn!(
                "Room2D {} does not extrude into a valid solid ({reason}); forcing a solid",
                room.identifier()
            );
            let repaired = force_solid(room, tol).map_err(|e| fail(format!("{reason}; forced solid failed: {e}")))?;
            let solid = check_extrusion(&repaired, tol).map_err(|e| fail(format!("forced solid is invalid: {e}")))?;
            (repaired, solid, ExtrusionOutcome::ForcedSolid { reason })
        }
    };

    let split_walls = config.split_walls && outcome == ExtrusionOutcome::Solid;
    let mut builder = FaceBuilder::new(&source, solid);
    builder.add_walls(if split_walls { story } else { None }, tol, &fail)?;
    let mut room3d = Room3D::new(source.identifier(), builder.faces, multiplier);
    let deferred = builder.deferred;

    let mut plenums = Vec::new();
    if config.add_plenums
        && let Some(story) = story
    {
        plenums = add_plenums(&source, &mut room3d, story, multiplier, tol).map_err(|e| fail(e.to_string()))?;
    }

    Ok(Extrusion {
        room: room3d,
        plenums,
        deferred,
        outcome,
    })
}

/// Extrudes the floor plate and checks that the plan is valid and the solid closed.
fn check_extrusion(room: &Room2D, tol: f64) -> std::result::Result<Solid, String> {
    if !room.plan().is_valid(tol) {
        return Err("the floor polygon intersects itself".to_string());
    }
    let solid = Solid::from_offset_face(room.floor_geometry(), room.floor_to_ceiling_height())
        .map_err(|e| e.to_string())?;
    if !solid.is_closed(tol) {
        return Err("the extruded solid is not closed".to_string());
    }
    Ok(solid)
}

/// Rebuilds the room on the largest valid region of its floor plate.
fn force_solid(room: &Room2D, tol: f64) -> Result<Room2D> {
    let shape = plan::repair(&room.plan())
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or_else(|| Error::degenerate(room.identifier(), "no valid region remains"))?;
    let segments = transplant_segments(
        &room.floor_segments_2d(),
        room.segments(),
        &shape_edges(&shape),
        Transplant::Subsegments,
        tol,
        room.floor_to_ceiling_height(),
    );
    room.derive(room.identifier(), &shape, segments, tol)
}

/// Collects faces of one room in output order.
struct FaceBuilder<'a> {
    room: &'a Room2D,
    polygons: Vec<Polygon>,
    faces: Vec<Face>,
    deferred: Vec<DeferredAdjacency>,
}

impl<'a> FaceBuilder<'a> {
    fn new(room: &'a Room2D, solid: Solid) -> Self {
        Self {
            room,
            polygons: solid.into_polygons(),
            faces: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn add_walls(&mut self, story: Option<&Story>, tol: f64, fail: &dyn Fn(String) -> Error) -> Result<()> {
        let room = self.room;
        let id = room.identifier();
        let n = room.segment_count();
        let floor_bc = if room.is_ground_contact {
            FaceBoundary::Ground
        } else {
            FaceBoundary::Adiabatic
        };
        self.faces
            .push(Face::new(&face_identifier(id, 0), self.polygons[0].clone(), FaceType::Floor, floor_bc));

        let edges = room.floor_segments();
        for (k, seg) in room.segments().iter().enumerate() {
            let face_id = wall_face_identifier(id, k);
            let (p1, p2) = edges[k];
            let mut strips = vec![];
            let mut bc = match &seg.boundary_condition {
                BoundaryCondition::Outdoors => FaceBoundary::Outdoors,
                BoundaryCondition::Ground => FaceBoundary::Ground,
                BoundaryCondition::Adiabatic => FaceBoundary::Adiabatic,
                BoundaryCondition::Surface(r) => FaceBoundary::surface(&r.face_identifier(), &r.room),
            };
            let mut polygon = self.polygons[k + 1].clone();

            if let (Some(r), Some(story)) = (seg.boundary_condition.surface_ref(), story)
                && let Some(neighbor) = story.room_2ds().find_by_name(&r.room)
            {
                let floor = room.floor_height();
                let flr_diff = neighbor.floor_height() - floor;
                let ciel_diff = room.ceiling_height() - neighbor.ceiling_height();
                if flr_diff > tol || ciel_diff > tol {
                    let lo = floor.max(neighbor.floor_height());
                    let hi = room.ceiling_height().min(neighbor.ceiling_height());
                    if hi - lo <= tol {
                        warn!("Wall {face_id} does not overlap its neighbor {} vertically; set to Adiabatic", r.room);
                        bc = FaceBoundary::Adiabatic;
                    } else {
                        let strip = |z0: f64, z1: f64| wall_polygon(p1, p2, z0 - floor, z1 - floor).map_err(|e| fail(e.to_string()));
                        if flr_diff > tol {
                            strips.push((format!("{face_id}_Below"), strip(floor, lo)?));
                        }
                        polygon = strip(lo, hi)?;
                        if ciel_diff > tol {
                            strips.push((format!("{face_id}_Above"), strip(hi, room.ceiling_height())?));
                        }
                    }
                }
            }

            if let FaceBoundary::Surface { face, room: target } = &bc {
                self.deferred.push(DeferredAdjacency {
                    face: face_id.clone(),
                    target_face: face.clone(),
                    target_room: target.clone(),
                });
            }
            let face_type = if seg.air_boundary && matches!(bc, FaceBoundary::Surface { .. }) {
                FaceType::AirBoundary
            } else {
                FaceType::Wall
            };
            let mut face = Face::new(&face_id, polygon, face_type, bc);
            if face_type == FaceType::Wall
                && matches!(face.boundary_condition, FaceBoundary::Outdoors | FaceBoundary::Surface { .. })
            {
                if let Some(window) = &seg.window_parameter {
                    window.add_windows_to_face(&mut face, tol).map_err(|e| fail(e.to_string()))?;
                }
                if face.boundary_condition.is_outdoors()
                    && let Some(shading) = &seg.shading_parameter
                {
                    shading.add_shading_to_face(&mut face, tol).map_err(|e| fail(e.to_string()))?;
                }
            }

            // Below strip first, then the shared part, then the above strip
            let below = strips.iter().position(|(sid, _)| sid.ends_with("_Below"));
            if let Some(i) = below {
                let (sid, poly) = strips.remove(i);
                self.faces.push(Face::new(&sid, poly, FaceType::Wall, FaceBoundary::Adiabatic));
            }
            self.faces.push(face);
            for (sid, poly) in strips {
                self.faces.push(Face::new(&sid, poly, FaceType::Wall, FaceBoundary::Adiabatic));
            }
        }

        let ceiling_bc = if room.is_top_exposed {
            FaceBoundary::Outdoors
        } else {
            FaceBoundary::Adiabatic
        };
        self.faces.push(Face::new(
            &face_identifier(id, n + 1),
            self.polygons[n + 1].clone(),
            FaceType::RoofCeiling,
            ceiling_bc,
        ));
        Ok(())
    }
}

/// Adds plenums filling the gap between the room and its Story's floor-to-floor span.
fn add_plenums(
    room: &Room2D,
    room3d: &mut Room3D,
    story: &Story,
    multiplier: usize,
    tol: f64,
) -> anyhow::Result<Vec<Room3D>> {
    let id = room.identifier();
    let n = room.segment_count();
    let story_floor = story.floor_height();
    let story_top = story_floor + story.floor_to_floor_height();
    let mut plenums = Vec::new();

    let plenum_wall_bc = |k: usize| match room.segments()[k].boundary_condition {
        BoundaryCondition::Outdoors => FaceBoundary::Outdoors,
        BoundaryCondition::Ground => FaceBoundary::Ground,
        _ => FaceBoundary::Adiabatic,
    };
    let build = |pid: &str, base: Polygon, height: f64, bottom: FaceBoundary, top: FaceBoundary| -> anyhow::Result<Room3D> {
        let solid = Solid::from_offset_face(&base, height)?;
        let polygons = solid.into_polygons();
        let last = polygons.len() - 1;
        let faces = polygons
            .into_iter()
            .enumerate()
            .map(|(i, poly)| {
                let fid = face_identifier(pid, i);
                match i {
                    0 => Face::new(&fid, poly, FaceType::Floor, bottom.clone()),
                    i if i == last => Face::new(&fid, poly, FaceType::RoofCeiling, top.clone()),
                    i => Face::new(&fid, poly, FaceType::Wall, plenum_wall_bc(i - 1)),
                }
            })
            .collect();
        let mut plenum = Room3D::new(pid, faces, multiplier);
        plenum.is_plenum = true;
        Ok(plenum)
    };

    let ceiling_gap = story_top - room.ceiling_height();
    if ceiling_gap > tol {
        let pid = format!("{id}_Ceiling_Plenum");
        let base = room
            .floor_geometry()
            .translate(&Vector::new(0., 0., room.floor_to_ceiling_height()));
        let top = if room.is_top_exposed {
            FaceBoundary::Outdoors
        } else {
            FaceBoundary::Adiabatic
        };
        let bottom = FaceBoundary::surface(&face_identifier(id, n + 1), id);
        plenums.push(build(&pid, base, ceiling_gap, bottom, top)?);
        if let Some(ceiling) = room3d.face_by_identifier_mut(&face_identifier(id, n + 1)) {
            ceiling.boundary_condition = FaceBoundary::surface(&face_identifier(&pid, 0), &pid);
        }
    }

    let floor_gap = room.floor_height() - story_floor;
    if floor_gap > tol {
        let pid = format!("{id}_Floor_Plenum");
        let base = room.floor_geometry().translate(&Vector::new(0., 0., -floor_gap));
        let bottom = if room.is_ground_contact {
            FaceBoundary::Ground
        } else {
            FaceBoundary::Adiabatic
        };
        let top = FaceBoundary::surface(&face_identifier(id, 0), id);
        plenums.push(build(&pid, base, floor_gap, bottom, top)?);
        if let Some(floor) = room3d.face_by_identifier_mut(&face_identifier(id, 0)) {
            floor.boundary_condition = FaceBoundary::surface(&face_identifier(&pid, n + 1), &pid);
        }
    }
    Ok(plenums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;
    use crate::windows::WindowParameter;

    fn rect(id: &str, x0: f64, w: f64, z: f64, h: f64) -> Room2D {
        Room2D::from_vertices(id, &[(x0, 0.), (x0 + w, 0.), (x0 + w, 10.), (x0, 10.)], &[], z, h).unwrap()
    }

    #[test]
    fn test_face_order_and_conditions() {
        let mut room = rect("A", 0., 5., 0., 3.);
        room.is_ground_contact = true;
        room.set_boundary_condition(2, BoundaryCondition::Adiabatic).unwrap();
        room.set_window_parameter(0, Some(WindowParameter::simple_ratio(0.4).unwrap()))
            .unwrap();
        let ext = extrude_room(&room, None, 1, &ConversionConfig::default()).unwrap();
        assert_eq!(ext.outcome, ExtrusionOutcome::Solid);
        let faces = &ext.room.faces;
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[0].identifier, "A..Face0");
        assert_eq!(faces[0].boundary_condition, FaceBoundary::Ground);
        assert_eq!(faces[3].boundary_condition, FaceBoundary::Adiabatic);
        assert_eq!(faces[5].identifier, "A..Face5");
        assert_eq!(faces[5].boundary_condition, FaceBoundary::Adiabatic);
        assert_eq!(faces[1].apertures.len(), 1);
        assert!(ext.room.exterior_aperture_area().is_close_tol(0.4 * 15., 1e-6));
        assert!(ext.room.volume().is_close_tol(150., 1e-6));
        assert!(ext.room.check_solid(0.01));
        assert!(ext.deferred.is_empty());
    }

    #[test]
    fn test_self_intersecting_floor_is_forced() {
        let room = Room2D::from_vertices("Bow", &[(0., 0.), (10., 0.), (10., 10.), (4., -3.)], &[], 0., 3.).unwrap();
        let ext = extrude_room(&room, None, 1, &ConversionConfig::default()).unwrap();
        assert!(matches!(ext.outcome, ExtrusionOutcome::ForcedSolid { .. }));
        assert!(ext.room.check_solid(0.01));
        // Largest lobe: triangle (5.38, 0), (10, 0), (10, 10)
        assert!(ext.room.floor_area().is_close_tol(0.5 * (10. - 70. / 13.) * 10., 1e-3));

        let diagnostic = ConversionConfig::default().with_diagnostic(true);
        let ext = extrude_room(&room, None, 1, &diagnostic).unwrap();
        assert!(matches!(ext.outcome, ExtrusionOutcome::Invalid { .. }));
    }
}
