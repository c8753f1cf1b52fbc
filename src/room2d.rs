//! Room2D: a floor plate with a floor-to-ceiling height.
//!
//! The floor polygon always faces up (counter-clockwise boundary in plan,
//! clockwise holes). Wall segment `k` stands on edge `k` of the polygon:
//! boundary edges first, then the edges of each hole. Each segment carries a
//! [`WallSegment`] with its boundary condition, window, shading and air
//! boundary flag, so any structural edit of the polygon moves all of them
//! together.

mod cleanup;
mod segment;
pub(crate) mod split;
pub(crate) mod transplant;
mod wire;

pub use segment::WallSegment;

use crate::boundary::{BoundaryCondition, SurfaceRef};
use crate::error::{Error, Result};
use crate::geom::bboxes::BoundingRect;
use crate::geom::plan::{self, PlanShape, Point2};
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::segment::length_2d;
use crate::geom::validate_name;
use crate::geom::vector::Vector;
use crate::name::HasName;
use crate::shading::ShadingParameter;
use crate::uid::UID;
use crate::windows::WindowParameter;
use serde::{Deserialize, Serialize};

/// Polygons whose normal deviates more than this from vertical are rejected.
const HORIZONTAL_NORMAL_MIN_DZ: f64 = 0.999;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "wire::Room2DData", into = "wire::Room2DData")]
pub struct Room2D {
    identifier: String,
    pub uid: UID,
    /// UID of the owning Story
    pub parent: Option<UID>,
    floor: Polygon,
    floor_to_ceiling_height: f64,
    segments: Vec<WallSegment>,
    pub is_ground_contact: bool,
    pub is_top_exposed: bool,
}

impl HasName for Room2D {
    fn get_name(&self) -> &str {
        &self.identifier
    }
}

impl Room2D {
    /// Creates a Room2D from a horizontal floor polygon.
    ///
    /// `segments` must be empty (all walls Outdoors) or hold one entry per
    /// polygon edge. A downward-facing polygon is flipped and its segments are
    /// reversed with it, so each segment stays on the same physical wall.
    pub fn new(
        identifier: &str,
        floor: Polygon,
        floor_to_ceiling_height: f64,
        segments: Vec<WallSegment>,
    ) -> Result<Self> {
        let identifier = validate_name(identifier).map_err(|e| Error::construction("Room2D", e))?;
        let invalid = |reason: String| Error::construction(format!("Room2D \"{identifier}\""), reason);

        if !floor_to_ceiling_height.is_finite() || floor_to_ceiling_height <= 0. {
            return Err(invalid(format!(
                "floor-to-ceiling height must be positive, got {floor_to_ceiling_height}"
            )));
        }
        if floor.normal().dz.abs() < HORIZONTAL_NORMAL_MIN_DZ {
            return Err(invalid("floor polygon is not horizontal".to_string()));
        }
        let segments = if segments.is_empty() {
            let top = floor.vertices().iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);
            // Rooms entirely below grade start with earth-contact walls.
            let default = if top + floor_to_ceiling_height <= 0. {
                WallSegment {
                    boundary_condition: BoundaryCondition::Ground,
                    ..WallSegment::default()
                }
            } else {
                WallSegment::default()
            };
            vec![default; floor.edge_count()]
        } else if segments.len() != floor.edge_count() {
            return Err(invalid(format!(
                "expected {} wall segments, got {}",
                floor.edge_count(),
                segments.len()
            )));
        } else {
            segments
        };
        let (floor, segments) = if floor.normal().dz < 0. {
            let flipped = reversed_segments(&floor, &segments);
            (floor.flip(), flipped)
        } else {
            (floor, segments)
        };
        for (i, seg) in segments.iter().enumerate() {
            seg.check().map_err(|e| invalid(format!("segment {i}: {e}")))?;
        }

        Ok(Self {
            identifier,
            uid: UID::new(),
            parent: None,
            floor,
            floor_to_ceiling_height,
            segments,
            is_ground_contact: false,
            is_top_exposed: false,
        })
    }

    /// Creates a Room2D with all walls Outdoors.
    pub fn from_polygon(identifier: &str, floor: Polygon, floor_to_ceiling_height: f64) -> Result<Self> {
        Self::new(identifier, floor, floor_to_ceiling_height, Vec::new())
    }

    /// Creates a Room2D from plan vertices at `floor_height`.
    pub fn from_vertices(
        identifier: &str,
        boundary: &[Point2],
        holes: &[Vec<Point2>],
        floor_height: f64,
        floor_to_ceiling_height: f64,
    ) -> Result<Self> {
        let lift = |pts: &[Point2]| pts.iter().map(|&(x, y)| Point::new(x, y, floor_height)).collect::<Vec<_>>();
        let (holes, _) = orient_holes(boundary, holes, Vec::new());
        let floor = Polygon::with_holes(lift(boundary), holes.iter().map(|h| lift(h)).collect(), None)
            .map_err(|e| Error::construction(format!("Room2D \"{identifier}\""), e))?;
        Self::from_polygon(identifier, floor, floor_to_ceiling_height)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn floor_geometry(&self) -> &Polygon {
        &self.floor
    }

    pub fn floor_to_ceiling_height(&self) -> f64 {
        self.floor_to_ceiling_height
    }

    pub fn floor_height(&self) -> f64 {
        self.floor.vertices().iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    pub fn ceiling_height(&self) -> f64 {
        self.floor_height() + self.floor_to_ceiling_height
    }

    pub fn segments(&self) -> &[WallSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&WallSegment> {
        self.segments.get(index)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Floor polygon edges, boundary first.
    pub fn floor_segments(&self) -> Vec<(Point, Point)> {
        self.floor.edges()
    }

    pub fn floor_segments_2d(&self) -> Vec<(Point2, Point2)> {
        self.floor
            .edges()
            .into_iter()
            .map(|(a, b)| (a.xy(), b.xy()))
            .collect()
    }

    pub fn segment_length(&self, index: usize) -> Option<f64> {
        let edges = self.floor_segments_2d();
        edges.get(index).map(|&(a, b)| length_2d(a, b))
    }

    /// Outward unit normals of the walls (zero for zero-length segments).
    pub fn segment_normals(&self) -> Vec<Vector> {
        self.floor_segments_2d()
            .into_iter()
            .map(|(a, b)| {
                Vector::new(b.1 - a.1, a.0 - b.0, 0.)
                    .normalize()
                    .unwrap_or(Vector::new(0., 0., 0.))
            })
            .collect()
    }

    /// Compass orientation of every wall normal in degrees (0 north, 90 east).
    ///
    /// `north_angle` is the counterclockwise angle of north from the +Y axis, in degrees.
    pub fn segment_orientations(&self, north_angle: f64) -> Vec<f64> {
        let a = north_angle.to_radians();
        let north = Vector::new(-a.sin(), a.cos(), 0.);
        self.segment_normals()
            .iter()
            .map(|n| north.angle_clockwise_xy(n).to_degrees() % 360.)
            .collect()
    }

    /// Plan bounding rectangle.
    pub fn bounding_rect(&self) -> BoundingRect {
        BoundingRect::from_points(self.floor.vertices())
    }

    pub fn min(&self) -> Point2 {
        self.bounding_rect().min
    }

    pub fn max(&self) -> Point2 {
        self.bounding_rect().max
    }

    pub fn floor_area(&self) -> f64 {
        self.floor.area()
    }

    pub fn volume(&self) -> f64 {
        self.floor_area() * self.floor_to_ceiling_height
    }

    /// Area of the walls with an Outdoors boundary condition.
    pub fn exterior_wall_area(&self) -> f64 {
        self.outdoor_segments()
            .map(|(len, _)| len * self.floor_to_ceiling_height)
            .sum()
    }

    /// Window area on walls with an Outdoors boundary condition.
    pub fn exterior_aperture_area(&self) -> f64 {
        self.outdoor_segments()
            .filter_map(|(len, seg)| {
                seg.window_parameter
                    .as_ref()
                    .map(|w| w.area_from_segment(len, self.floor_to_ceiling_height))
            })
            .sum()
    }

    fn outdoor_segments(&self) -> impl Iterator<Item = (f64, &WallSegment)> {
        self.floor_segments_2d()
            .into_iter()
            .zip(self.segments.iter())
            .filter(|(_, seg)| seg.boundary_condition.is_outdoors())
            .map(|((a, b), seg)| (length_2d(a, b), seg))
    }

    /// Segments referencing other rooms, with their index.
    pub fn surface_references(&self) -> impl Iterator<Item = (usize, &SurfaceRef)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.boundary_condition.surface_ref().map(|r| (i, r)))
    }

    fn segment_error(&self, segment: usize, reason: impl Into<String>) -> Error {
        Error::InvalidBoundaryCondition {
            room: self.identifier.clone(),
            segment,
            reason: reason.into(),
        }
    }

    fn segment_mut(&mut self, index: usize) -> Result<&mut WallSegment> {
        let count = self.segments.len();
        if index >= count {
            return Err(self.segment_error(index, format!("segment index out of range ({count} segments)")));
        }
        Ok(&mut self.segments[index])
    }

    /// Sets the boundary condition of one wall.
    ///
    /// Fails if the wall has a window and `bc` is not Outdoors or Surface.
    /// Leaving a Surface condition clears the air boundary flag.
    pub fn set_boundary_condition(&mut self, index: usize, bc: BoundaryCondition) -> Result<()> {
        let seg = self.segment_mut(index)?;
        if seg.window_parameter.is_some() && !bc.allows_windows() {
            let reason = format!("cannot set {bc} on a wall with a window");
            return Err(self.segment_error(index, reason));
        }
        let seg = self.segment_mut(index)?;
        if !bc.is_surface() {
            seg.air_boundary = false;
        }
        seg.boundary_condition = bc;
        Ok(())
    }

    pub fn set_window_parameter(&mut self, index: usize, window: Option<WindowParameter>) -> Result<()> {
        let mut candidate = self.segment_mut(index)?.clone();
        candidate.window_parameter = window;
        candidate.check().map_err(|e| self.segment_error(index, e))?;
        *self.segment_mut(index)? = candidate;
        Ok(())
    }

    pub fn set_shading_parameter(&mut self, index: usize, shading: Option<ShadingParameter>) -> Result<()> {
        let mut candidate = self.segment_mut(index)?.clone();
        candidate.shading_parameter = shading;
        candidate.check().map_err(|e| self.segment_error(index, e))?;
        *self.segment_mut(index)? = candidate;
        Ok(())
    }

    /// Flags a Surface wall without windows as an air boundary.
    pub fn set_air_boundary(&mut self, index: usize, air_boundary: bool) -> Result<()> {
        let mut candidate = self.segment_mut(index)?.clone();
        candidate.air_boundary = air_boundary;
        candidate.check().map_err(|e| self.segment_error(index, e))?;
        *self.segment_mut(index)? = candidate;
        Ok(())
    }

    /// Replaces all wall segments at once.
    pub fn set_segments(&mut self, segments: Vec<WallSegment>) -> Result<()> {
        if segments.len() != self.floor.edge_count() {
            return Err(Error::construction(
                format!("Room2D \"{}\"", self.identifier),
                format!("expected {} wall segments, got {}", self.floor.edge_count(), segments.len()),
            ));
        }
        for (i, seg) in segments.iter().enumerate() {
            seg.check().map_err(|e| self.segment_error(i, e))?;
        }
        self.segments = segments;
        Ok(())
    }

    /// Sets the window of every Outdoors wall.
    pub fn set_outdoor_window_parameters(&mut self, window: Option<WindowParameter>) -> Result<()> {
        if let Some(w) = &window {
            w.validate()?;
        }
        for seg in self.segments.iter_mut().filter(|s| s.boundary_condition.is_outdoors()) {
            seg.window_parameter = window.clone();
        }
        Ok(())
    }

    /// Sets the shading of every Outdoors wall.
    pub fn set_outdoor_shading_parameters(&mut self, shading: Option<ShadingParameter>) -> Result<()> {
        if let Some(s) = &shading {
            s.validate()?;
        }
        for seg in self.segments.iter_mut().filter(|s| s.boundary_condition.is_outdoors()) {
            seg.shading_parameter = shading.clone();
        }
        Ok(())
    }

    /// Turns every Surface wall back into an Outdoors wall.
    pub fn reset_adjacency(&mut self) {
        for seg in &mut self.segments {
            if seg.boundary_condition.is_surface() {
                seg.boundary_condition = BoundaryCondition::Outdoors;
                seg.air_boundary = false;
            }
        }
    }

    /// Resets Surface walls that point at `room`.
    pub fn reset_adjacency_to(&mut self, room: &str) {
        for seg in &mut self.segments {
            if seg.boundary_condition.surface_ref().is_some_and(|r| r.room == room) {
                seg.boundary_condition = BoundaryCondition::Outdoors;
                seg.air_boundary = false;
            }
        }
    }

    /// Marks wall `index` of this room and wall `other_index` of `other` as adjacent.
    ///
    /// Windows on the two sides must be identical.
    pub fn set_adjacency(&mut self, index: usize, other: &mut Room2D, other_index: usize) -> Result<()> {
        let conflict = |reason: &str, a: &Room2D, b: &Room2D| Error::AdjacencyConflict {
            room_a: a.identifier.clone(),
            segment_a: index,
            room_b: b.identifier.clone(),
            segment_b: other_index,
            reason: reason.to_string(),
        };
        let (Some(seg_a), Some(seg_b)) = (self.segments.get(index), other.segments.get(other_index)) else {
            return Err(conflict("segment index out of range", self, other));
        };
        if seg_a.window_parameter != seg_b.window_parameter {
            return Err(conflict("the walls have different window parameters", self, other));
        }
        self.segments[index].boundary_condition = BoundaryCondition::surface(&other.identifier, other_index);
        other.segments[other_index].boundary_condition = BoundaryCondition::surface(&self.identifier, index);
        Ok(())
    }

    pub fn move_by(&mut self, vec: &Vector) {
        self.floor = self.floor.translate(vec);
    }

    /// Rotates counterclockwise around `origin` in plan. `angle` is in degrees.
    pub fn rotate_xy(&mut self, angle: f64, origin: Point) -> Result<()> {
        self.floor = self.floor.rotate_xy(angle.to_radians(), origin)?;
        Ok(())
    }

    /// Reflects across a vertical plane through `origin` with normal `normal`.
    ///
    /// The mirrored polygon is flipped back to face up, which reverses the
    /// order of the segments in every loop.
    pub fn reflect(&mut self, normal: &Vector, origin: Point) -> Result<()> {
        let normal = Vector::new(normal.dx, normal.dy, 0.);
        let mirrored = self.floor.reflect(&normal, origin)?;
        self.segments = reversed_segments(&mirrored, &self.segments);
        self.floor = mirrored.flip();
        Ok(())
    }

    /// Scales the room, its heights and its window and shading dimensions.
    pub fn scale(&mut self, factor: f64, origin: Option<Point>) -> Result<()> {
        if !(factor > 0.) {
            return Err(Error::construction(
                format!("Room2D \"{}\"", self.identifier),
                format!("scale factor must be positive, got {factor}"),
            ));
        }
        let origin = origin.unwrap_or(Point::new(0., 0., 0.));
        self.floor = self.floor.scale(factor, origin)?;
        self.floor_to_ceiling_height *= factor;
        for seg in &mut self.segments {
            seg.window_parameter = seg.window_parameter.as_ref().map(|w| w.scale(factor));
            seg.shading_parameter = seg.shading_parameter.as_ref().map(|s| s.scale(factor));
        }
        Ok(())
    }

    /// Checks that all floor vertices lie within `tol` of the floor height.
    ///
    /// Returns `Ok(false)` for a non-horizontal floor, or an error if `raise` is set.
    pub fn check_horizontal(&self, tol: f64, raise: bool) -> Result<bool> {
        let z = self.floor_height();
        let bad = self.floor.loops().flatten().find(|p| (p.z - z).abs() > tol);
        match bad {
            None => Ok(true),
            Some(p) if raise => Err(Error::construction(
                format!("Room2D \"{}\"", self.identifier),
                format!("vertex {p} is not within {tol} of the floor height {z}"),
            )),
            Some(_) => Ok(false),
        }
    }

    /// Prefixes the identifier and every Surface reference with `prefix_`.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = format!("{prefix}_{}", self.identifier);
        for seg in &mut self.segments {
            if let BoundaryCondition::Surface(r) = &mut seg.boundary_condition {
                r.room = format!("{prefix}_{}", r.room);
            }
        }
    }

    /// Copy with a fresh UID and no parent.
    pub fn duplicate(&self) -> Self {
        let mut room = self.clone();
        room.uid = UID::new();
        room.parent = None;
        room
    }

    /// Plan shape of the floor, with the stored loop order.
    pub(crate) fn plan(&self) -> PlanShape {
        let flat = |l: &Vec<Point>| l.iter().map(|p| p.xy()).collect::<Vec<_>>();
        PlanShape {
            boundary: flat(&self.floor.vertices().to_vec()),
            holes: self.floor.holes().iter().map(flat).collect(),
        }
    }

    /// Replaces the floor with `shape` at the current floor height.
    ///
    /// `shape` must already be oriented (counter-clockwise boundary).
    pub(crate) fn replace_geometry(
        &mut self,
        shape: &PlanShape,
        segments: Vec<WallSegment>,
        tol: f64,
    ) -> Result<()> {
        check_degenerate(&self.identifier, shape, tol)?;
        let floor = Polygon::from_plan(shape, self.floor_height())
            .map_err(|e| Error::degenerate(self.identifier.clone(), e))?;
        if segments.len() != floor.edge_count() {
            return Err(Error::construction(
                format!("Room2D \"{}\"", self.identifier),
                format!("expected {} wall segments, got {}", floor.edge_count(), segments.len()),
            ));
        }
        for (i, seg) in segments.iter().enumerate() {
            seg.check().map_err(|e| self.segment_error(i, e))?;
        }
        self.floor = floor;
        self.segments = segments;
        Ok(())
    }

    /// New room with the same heights and flags on a different floor shape.
    pub(crate) fn derive(
        &self,
        identifier: &str,
        shape: &PlanShape,
        segments: Vec<WallSegment>,
        tol: f64,
    ) -> Result<Self> {
        let mut room = self.clone();
        room.identifier = validate_name(identifier).map_err(|e| Error::construction("Room2D", e))?;
        room.uid = UID::new();
        room.replace_geometry(shape, segments, tol)?;
        Ok(room)
    }
}

/// Rejects shapes with fewer than 3 vertices or an area below `max_dimension * tol`.
pub(crate) fn check_degenerate(identifier: &str, shape: &PlanShape, tol: f64) -> Result<()> {
    if shape.boundary.len() < 3 {
        return Err(Error::degenerate(
            identifier,
            format!("{} boundary vertices remain", shape.boundary.len()),
        ));
    }
    let area = shape.area();
    let min_area = shape.max_dimension() * tol;
    if area < min_area {
        return Err(Error::degenerate(
            identifier,
            format!("floor area {area} is below {min_area}"),
        ));
    }
    Ok(())
}

/// Turns every hole that runs the same way as the boundary, keeping its first
/// vertex, and reorders that hole's slice of `segments` to match. `segments`
/// may be empty; a length that does not match the edge count is left as is.
fn orient_holes(
    boundary: &[Point2],
    holes: &[Vec<Point2>],
    segments: Vec<WallSegment>,
) -> (Vec<Vec<Point2>>, Vec<WallSegment>) {
    let edge_count = boundary.len() + holes.iter().map(Vec::len).sum::<usize>();
    let aligned = segments.len() == edge_count;
    let boundary_ccw = plan::is_ccw(boundary);
    let mut out_holes = Vec::with_capacity(holes.len());
    let mut out_segments = segments.clone();
    let mut offset = boundary.len();
    for hole in holes {
        let n = hole.len();
        if n < 3 || plan::is_ccw(hole) != boundary_ccw {
            out_holes.push(hole.clone());
            offset += n;
            continue;
        }
        out_holes.push(plan::reverse_loop(hole));
        if aligned {
            for j in 0..n {
                let k = n - 1 - j;
                let len = length_2d(hole[k], hole[(k + 1) % n]);
                let mut seg = segments[offset + k].clone();
                seg.window_parameter = seg.window_parameter.as_ref().map(|w| w.flip(len));
                out_segments[offset + j] = seg;
            }
        }
        offset += n;
    }
    (out_holes, out_segments)
}

/// Segments matching `polygon.flip()`: reversed per loop, windows mirrored.
fn reversed_segments(polygon: &Polygon, segments: &[WallSegment]) -> Vec<WallSegment> {
    let edges = polygon.edges();
    let mut out = Vec::with_capacity(segments.len());
    let mut offset = 0;
    for lp in polygon.loops() {
        let n = lp.len();
        for j in 0..n {
            let k = offset + n - 1 - j;
            let mut seg = segments[k].clone();
            let (a, b) = edges[k];
            let len = a.distance(&b);
            seg.window_parameter = seg.window_parameter.as_ref().map(|w| w.flip(len));
            out.push(seg);
        }
        offset += n;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    fn rect(id: &str, x0: f64, y0: f64, w: f64, d: f64, z: f64, h: f64) -> Room2D {
        Room2D::from_vertices(
            id,
            &[(x0, y0), (x0 + w, y0), (x0 + w, y0 + d), (x0, y0 + d)],
            &[],
            z,
            h,
        )
        .unwrap()
    }

    #[test]
    fn test_construction() {
        let room = rect("Office", 0., 0., 10., 5., 3., 3.);
        assert_eq!(room.segment_count(), 4);
        assert!(room.floor_height().is_close(3.));
        assert!(room.ceiling_height().is_close(6.));
        assert!(room.floor_area().is_close(50.));
        assert!(room.volume().is_close(150.));
        assert!(room.exterior_wall_area().is_close(90.));
        assert!(Room2D::from_vertices("Zero", &[(0., 0.), (1., 0.), (1., 1.)], &[], 0., 0.).is_err());
        assert!(Room2D::from_vertices("", &[(0., 0.), (1., 0.), (1., 1.)], &[], 0., 3.).is_err());
    }

    #[test]
    fn test_below_grade_walls_default_to_ground() {
        let basement = rect("Basement", 0., 0., 8., 6., -4., 3.);
        assert!(basement.segments().iter().all(|s| s.boundary_condition == BoundaryCondition::Ground));
        assert!(basement.exterior_wall_area().is_close(0.));

        let flush = rect("Cellar", 0., 0., 8., 6., -3., 3.);
        assert!(flush.segments().iter().all(|s| s.boundary_condition == BoundaryCondition::Ground));

        let half_sunk = rect("Garden", 0., 0., 8., 6., -1.5, 3.);
        assert!(half_sunk.segments().iter().all(|s| s.boundary_condition.is_outdoors()));
    }

    #[test]
    fn test_clockwise_input_is_flipped_with_segments() {
        let pts = vec![
            Point::new(0., 0., 0.),
            Point::new(0., 4., 0.),
            Point::new(6., 4., 0.),
            Point::new(6., 0., 0.),
        ];
        let floor = Polygon::new(pts, None).unwrap();
        let mut segments = vec![WallSegment::default(); 4];
        // Wall on x = 0
        segments[0].boundary_condition = BoundaryCondition::Ground;
        let room = Room2D::new("CW", floor, 3., segments).unwrap();
        assert!(room.floor_geometry().normal().dz > 0.);
        let edges = room.floor_segments_2d();
        let ground = room
            .segments()
            .iter()
            .position(|s| s.boundary_condition == BoundaryCondition::Ground)
            .unwrap();
        let (a, b) = edges[ground];
        assert!(a.0.is_close(0.) && b.0.is_close(0.));
    }

    #[test]
    fn test_segment_length_mismatch() {
        let room = rect("A", 0., 0., 1., 1., 0., 3.);
        let floor = room.floor_geometry().clone();
        assert!(matches!(
            Room2D::new("A", floor, 3., vec![WallSegment::default(); 3]),
            Err(Error::Construction { .. })
        ));
    }

    #[test]
    fn test_boundary_condition_setter_rejects_ground_with_window() {
        let mut room = rect("A", 0., 0., 4., 4., 0., 3.);
        room.set_window_parameter(0, Some(WindowParameter::simple_ratio(0.4).unwrap()))
            .unwrap();
        let err = room.set_boundary_condition(0, BoundaryCondition::Ground).unwrap_err();
        assert!(matches!(err, Error::InvalidBoundaryCondition { segment: 0, .. }));
        assert_eq!(room.segments()[0].boundary_condition, BoundaryCondition::Outdoors);
        room.set_boundary_condition(1, BoundaryCondition::Ground).unwrap();
        assert!(room.set_window_parameter(1, Some(WindowParameter::simple_ratio(0.2).unwrap())).is_err());
        assert!(room.set_boundary_condition(9, BoundaryCondition::Adiabatic).is_err());
    }

    #[test]
    fn test_air_boundary_needs_surface() {
        let mut room = rect("A", 0., 0., 4., 4., 0., 3.);
        assert!(room.set_air_boundary(0, true).is_err());
        room.set_boundary_condition(0, BoundaryCondition::surface("B", 2)).unwrap();
        room.set_air_boundary(0, true).unwrap();
        room.reset_adjacency();
        assert!(!room.segments()[0].air_boundary);
        assert!(room.segments()[0].boundary_condition.is_outdoors());
    }

    #[test]
    fn test_exterior_aperture_area() {
        let mut room = rect("A", 0., 0., 10., 5., 0., 3.);
        room.set_outdoor_window_parameters(Some(WindowParameter::simple_ratio(0.4).unwrap()))
            .unwrap();
        assert!(room.exterior_aperture_area().is_close_tol(0.4 * 90., 1e-9));
        room.set_boundary_condition(0, BoundaryCondition::surface("B", 0)).unwrap();
        assert!(room.exterior_aperture_area().is_close_tol(0.4 * 60., 1e-9));
    }

    #[test]
    fn test_orientations() {
        let room = rect("A", 0., 0., 4., 4., 0., 3.);
        // Edges: south, east, north, west
        let o = room.segment_orientations(0.);
        let expected = [180., 90., 0., 270.];
        for (got, want) in o.iter().zip(expected) {
            assert!(got.is_close_tol(want, 1e-9), "{got} != {want}");
        }
    }

    #[test]
    fn test_reflect_keeps_segments_on_walls() {
        let mut room = rect("A", 0., 0., 4., 2., 0., 3.);
        let window = WindowParameter::detailed(vec![vec![(0.5, 1.), (1., 1.), (1., 2.), (0.5, 2.)]]).unwrap();
        // South wall (y = 0)
        room.set_window_parameter(0, Some(window)).unwrap();
        room.reflect(&Vector::new(1., 0., 0.), Point::new(0., 0., 0.)).unwrap();
        assert!(room.floor_geometry().normal().dz > 0.);
        let edges = room.floor_segments_2d();
        let idx = room.segments().iter().position(|s| s.window_parameter.is_some()).unwrap();
        let (a, b) = edges[idx];
        assert!(a.1.is_close(0.) && b.1.is_close(0.));
        // Window was 0.5..1 from the wall's west end; after mirroring it is 0.5..1 from x = 0
        let WindowParameter::DetailedWindows { polygons } = room.segments()[idx].window_parameter.as_ref().unwrap()
        else {
            panic!("Expected detailed windows");
        };
        let xs: Vec<f64> = polygons[0].iter().map(|&(u, _)| a.0 + (b.0 - a.0).signum() * u).collect();
        assert!(xs.iter().all(|x| (-1.0..=-0.5).contains(x)));
    }

    #[test]
    fn test_scale_and_prefix() {
        let mut room = rect("A", 0., 0., 2., 2., 1., 3.);
        room.set_boundary_condition(0, BoundaryCondition::surface("B", 1)).unwrap();
        room.scale(2., None).unwrap();
        assert!(room.floor_area().is_close(16.));
        assert!(room.floor_to_ceiling_height().is_close(6.));
        assert!(room.floor_height().is_close(2.));
        room.add_prefix("L2");
        assert_eq!(room.identifier(), "L2_A");
        assert_eq!(room.segments()[0].boundary_condition, BoundaryCondition::surface("L2_B", 1));
    }

    #[test]
    fn test_check_horizontal() {
        let pts = vec![
            Point::new(0., 0., 0.),
            Point::new(4., 0., 0.),
            Point::new(4., 4., 0.005),
            Point::new(0., 4., 0.),
        ];
        let room = Room2D::from_polygon("A", Polygon::new(pts, None).unwrap(), 3.).unwrap();
        assert!(room.check_horizontal(0.01, true).unwrap());
        assert!(!room.check_horizontal(0.001, false).unwrap());
        assert!(room.check_horizontal(0.001, true).is_err());
    }

    #[test]
    fn test_set_adjacency() {
        let mut a = rect("A", 0., 0., 4., 4., 0., 3.);
        let mut b = rect("B", 4., 0., 4., 4., 0., 3.);
        a.set_adjacency(1, &mut b, 3).unwrap();
        assert_eq!(a.segments()[1].boundary_condition, BoundaryCondition::surface("B", 3));
        assert_eq!(b.segments()[3].boundary_condition, BoundaryCondition::surface("A", 1));

        let mut c = rect("C", 8., 0., 4., 4., 0., 3.);
        c.set_window_parameter(3, Some(WindowParameter::simple_ratio(0.3).unwrap()))
            .unwrap();
        assert!(matches!(
            b.set_adjacency(1, &mut c, 3),
            Err(Error::AdjacencyConflict { .. })
        ));
    }
}
