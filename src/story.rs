//! Story: Room2Ds sharing one floor elevation band.
//!
//! A Story owns its Room2Ds. Floor height and floor-to-floor height are
//! computed from the members unless explicitly overridden, so they never go
//! stale when membership changes. `multiplier` says how many times the Story
//! repeats upward, `floor_to_floor_height` apart.

use crate::adjacency::{AdjacencyRecord, intersect_adjacency, solve_adjacency};
use crate::config::{ConversionConfig, WindowConflictPolicy};
use crate::error::{BatchReport, Error, Result};
use crate::extrude::{ExtrusionOutcome, extrude_room};
use crate::geom::bboxes::BoundingRect;
use crate::geom::plan::{self, PlanShape, Point2};
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::{IsClose, validate_name};
use crate::geom::vector::Vector;
use crate::name::{FindByName, HasName};
use crate::room2d::split::shape_edges;
use crate::room2d::transplant::{Transplant, transplant_segments};
use crate::room2d::Room2D;
use crate::room3d::{FaceBoundary, Room3D};
use crate::shading::ShadingParameter;
use crate::uid::UID;
use crate::windows::WindowParameter;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoryData", into = "StoryData")]
pub struct Story {
    identifier: String,
    pub uid: UID,
    /// UID of the owning Building
    pub parent: Option<UID>,
    room_2ds: Vec<Room2D>,
    floor_height: Option<f64>,
    floor_to_floor_height: Option<f64>,
    multiplier: usize,
}

impl HasName for Story {
    fn get_name(&self) -> &str {
        &self.identifier
    }
}

/// 3D rooms of a converted Story or Building.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    /// Rooms in Room2D order, followed by plenums.
    pub rooms: Vec<Room3D>,
    /// How each Room2D was extruded, by identifier.
    pub outcomes: Vec<(String, ExtrusionOutcome)>,
    pub report: BatchReport,
}

impl Story {
    /// Creates a Story from at least one Room2D.
    ///
    /// Fails on duplicate room identifiers and on floor heights that differ
    /// too much to share walls.
    pub fn new(identifier: &str, room_2ds: Vec<Room2D>) -> Result<Self> {
        let identifier = validate_name(identifier).map_err(|e| Error::construction("Story", e))?;
        let mut story = Self {
            identifier,
            uid: UID::new(),
            parent: None,
            room_2ds: Vec::new(),
            floor_height: None,
            floor_to_floor_height: None,
            multiplier: 1,
        };
        story.set_room_2ds(room_2ds)?;
        Ok(story)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn room_2ds(&self) -> &[Room2D] {
        &self.room_2ds
    }

    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: usize) -> Result<()> {
        if multiplier < 1 {
            return Err(Error::construction(
                format!("Story \"{}\"", self.identifier),
                "multiplier must be at least 1",
            ));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    /// Explicit floor height, or the lowest member floor.
    pub fn floor_height(&self) -> f64 {
        self.floor_height.unwrap_or_else(|| {
            self.room_2ds
                .iter()
                .map(|r| r.floor_height())
                .fold(f64::INFINITY, f64::min)
        })
    }

    /// Explicit floor-to-floor height, or the highest member ceiling above the floor height.
    pub fn floor_to_floor_height(&self) -> f64 {
        self.floor_to_floor_height.unwrap_or_else(|| {
            let top = self
                .room_2ds
                .iter()
                .map(|r| r.ceiling_height())
                .fold(f64::NEG_INFINITY, f64::max);
            top - self.floor_height()
        })
    }

    /// Overrides the floor height (`None` goes back to the computed value).
    pub fn set_floor_height(&mut self, floor_height: Option<f64>) {
        self.floor_height = floor_height;
    }

    pub fn set_floor_to_floor_height(&mut self, height: Option<f64>) -> Result<()> {
        if let Some(h) = height
            && !(h > 0.)
        {
            return Err(Error::construction(
                format!("Story \"{}\"", self.identifier),
                format!("floor-to-floor height must be positive, got {h}"),
            ));
        }
        self.floor_to_floor_height = height;
        Ok(())
    }

    pub fn room_by_identifier(&self, identifier: &str) -> Result<&Room2D> {
        self.room_2ds
            .find_by_name(identifier)
            .ok_or_else(|| Error::not_found("Room2D", identifier))
    }

    pub fn room_by_identifier_mut(&mut self, identifier: &str) -> Result<&mut Room2D> {
        self.room_2ds
            .iter_mut()
            .find(|r| r.identifier() == identifier)
            .ok_or_else(|| Error::not_found("Room2D", identifier))
    }

    pub fn rooms_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Room2D>> {
        identifiers.iter().map(|id| self.room_by_identifier(id)).collect()
    }

    pub fn add_room_2d(&mut self, room: Room2D) -> Result<()> {
        self.add_room_2ds(vec![room])
    }

    /// Adds rooms after checking their identifiers and floor heights against the members.
    pub fn add_room_2ds(&mut self, rooms: Vec<Room2D>) -> Result<()> {
        let mut all: Vec<&Room2D> = self.room_2ds.iter().collect();
        all.extend(rooms.iter());
        self.check_duplicates(&all)?;
        let existing: Vec<&Room2D> = self.room_2ds.iter().collect();
        let new: Vec<&Room2D> = rooms.iter().collect();
        check_floor_heights(&self.identifier, &existing, &new)?;
        for mut room in rooms {
            room.parent = Some(self.uid.clone());
            self.room_2ds.push(room);
        }
        Ok(())
    }

    /// Replaces all members. The new set is checked against itself.
    pub fn set_room_2ds(&mut self, rooms: Vec<Room2D>) -> Result<()> {
        if rooms.is_empty() {
            return Err(Error::construction(
                format!("Story \"{}\"", self.identifier),
                "a Story needs at least one Room2D",
            ));
        }
        let refs: Vec<&Room2D> = rooms.iter().collect();
        self.check_duplicates(&refs)?;
        check_floor_heights(&self.identifier, &refs, &refs)?;
        self.room_2ds = rooms;
        for room in &mut self.room_2ds {
            room.parent = Some(self.uid.clone());
        }
        Ok(())
    }

    /// Removes a room and resets walls of other members that referenced it.
    pub fn remove_room_2d(&mut self, identifier: &str) -> Result<Room2D> {
        let index = self
            .room_2ds
            .position_by_name(identifier)
            .ok_or_else(|| Error::not_found("Room2D", identifier))?;
        if self.room_2ds.len() == 1 {
            return Err(Error::construction(
                format!("Story \"{}\"", self.identifier),
                "cannot remove the last Room2D",
            ));
        }
        let mut room = self.room_2ds.remove(index);
        room.parent = None;
        for other in &mut self.room_2ds {
            other.reset_adjacency_to(identifier);
        }
        Ok(room)
    }

    fn check_duplicates(&self, rooms: &[&Room2D]) -> Result<()> {
        let dups = rooms.duplicate_names();
        if dups.is_empty() {
            Ok(())
        } else {
            Err(Error::construction(
                format!("Story \"{}\"", self.identifier),
                format!("duplicate Room2D identifiers: {}", dups.join(", ")),
            ))
        }
    }

    /// Plan bounding rectangle of all rooms.
    pub fn bounding_rect(&self) -> BoundingRect {
        self.room_2ds
            .iter()
            .map(|r| r.bounding_rect())
            .reduce(|a, b| a.union(&b))
            .unwrap_or(BoundingRect {
                min: (0., 0.),
                max: (0., 0.),
            })
    }

    pub fn min(&self) -> Point2 {
        self.bounding_rect().min
    }

    pub fn max(&self) -> Point2 {
        self.bounding_rect().max
    }

    /// Sum over rooms, not multiplied by the multiplier.
    pub fn floor_area(&self) -> f64 {
        self.room_2ds.iter().map(|r| r.floor_area()).sum()
    }

    pub fn volume(&self) -> f64 {
        self.room_2ds.iter().map(|r| r.volume()).sum()
    }

    pub fn exterior_wall_area(&self) -> f64 {
        self.room_2ds.iter().map(|r| r.exterior_wall_area()).sum()
    }

    pub fn exterior_aperture_area(&self) -> f64 {
        self.room_2ds.iter().map(|r| r.exterior_aperture_area()).sum()
    }

    /// Union of the room floors at the Story floor height (courtyards become holes).
    pub fn footprint(&self, tol: f64) -> Vec<Polygon> {
        let plans: Vec<PlanShape> = self.room_2ds.iter().map(|r| r.plan()).collect();
        let z = self.floor_height();
        plan::union(&plans)
            .iter()
            .filter(|s| s.area() > s.max_dimension() * tol)
            .filter_map(|s| Polygon::from_plan(s, z).ok())
            .collect()
    }

    /// Edges of the footprint loops.
    pub fn outline_segments(&self, tol: f64) -> Vec<(Point, Point)> {
        self.footprint(tol).iter().flat_map(|p| p.edges()).collect()
    }

    /// Solves adjacency between the members.
    ///
    /// With `air_boundary`, matched walls without windows become air boundaries.
    pub fn solve_room_2d_adjacency(
        &mut self,
        tol: f64,
        policy: WindowConflictPolicy,
        air_boundary: bool,
    ) -> Result<Vec<AdjacencyRecord>> {
        let records = solve_adjacency(&mut self.room_2ds, tol, policy)?;
        if air_boundary {
            for rec in &records {
                let has_window = self.room_2ds[rec.room_a].segments()[rec.segment_a]
                    .window_parameter
                    .is_some();
                if has_window {
                    warn!(
                        "Wall {} of {} has windows and is not made an air boundary",
                        rec.segment_a,
                        self.room_2ds[rec.room_a].identifier()
                    );
                    continue;
                }
                self.room_2ds[rec.room_a].set_air_boundary(rec.segment_a, true)?;
                self.room_2ds[rec.room_b].set_air_boundary(rec.segment_b, true)?;
            }
        }
        info!(
            "Story {}: {} adjacent wall pair(s) found",
            self.identifier,
            records.len()
        );
        Ok(records)
    }

    pub fn intersect_room_2d_adjacency(&mut self, tol: f64, preserve_exterior: bool) -> Result<Vec<usize>> {
        intersect_adjacency(&mut self.room_2ds, tol, preserve_exterior)
    }

    pub fn reset_adjacency(&mut self) {
        for room in &mut self.room_2ds {
            room.reset_adjacency();
        }
    }

    pub fn set_outdoor_window_parameters(&mut self, window: Option<WindowParameter>) -> Result<()> {
        for room in &mut self.room_2ds {
            room.set_outdoor_window_parameters(window.clone())?;
        }
        Ok(())
    }

    pub fn set_outdoor_shading_parameters(&mut self, shading: Option<ShadingParameter>) -> Result<()> {
        for room in &mut self.room_2ds {
            room.set_outdoor_shading_parameters(shading.clone())?;
        }
        Ok(())
    }

    pub fn set_ground_contact(&mut self, is_ground_contact: bool) {
        for room in &mut self.room_2ds {
            room.is_ground_contact = is_ground_contact;
        }
    }

    pub fn set_top_exposed(&mut self, is_top_exposed: bool) {
        for room in &mut self.room_2ds {
            room.is_top_exposed = is_top_exposed;
        }
    }

    pub fn move_by(&mut self, vec: &Vector) {
        for room in &mut self.room_2ds {
            room.move_by(vec);
        }
        if let Some(h) = &mut self.floor_height {
            *h += vec.dz;
        }
    }

    /// Rotates counterclockwise in plan. `angle` is in degrees.
    pub fn rotate_xy(&mut self, angle: f64, origin: Point) -> Result<()> {
        for room in &mut self.room_2ds {
            room.rotate_xy(angle, origin)?;
        }
        Ok(())
    }

    pub fn reflect(&mut self, normal: &Vector, origin: Point) -> Result<()> {
        for room in &mut self.room_2ds {
            room.reflect(normal, origin)?;
        }
        Ok(())
    }

    pub fn scale(&mut self, factor: f64, origin: Option<Point>) -> Result<()> {
        for room in &mut self.room_2ds {
            room.scale(factor, origin)?;
        }
        let oz = origin.map_or(0., |p| p.z);
        if let Some(h) = &mut self.floor_height {
            *h = oz + (*h - oz) * factor;
        }
        if let Some(h) = &mut self.floor_to_floor_height {
            *h *= factor;
        }
        Ok(())
    }

    /// Prefixes the Story, its rooms and their Surface references with `prefix_`.
    pub fn add_prefix(&mut self, prefix: &str) {
        self.identifier = format!("{prefix}_{}", self.identifier);
        for room in &mut self.room_2ds {
            room.add_prefix(prefix);
        }
    }

    /// Copy with fresh UIDs for the Story and its rooms.
    pub fn duplicate(&self) -> Self {
        let uid = UID::new();
        let room_2ds = self
            .room_2ds
            .iter()
            .map(|r| {
                let mut room = r.duplicate();
                room.parent = Some(uid.clone());
                room
            })
            .collect();
        Self {
            identifier: self.identifier.clone(),
            uid,
            parent: None,
            room_2ds,
            floor_height: self.floor_height,
            floor_to_floor_height: self.floor_to_floor_height,
            multiplier: self.multiplier,
        }
    }

    /// Duplicate describing one floor only.
    pub(crate) fn single_repeat(&self) -> Self {
        let mut story = self.duplicate();
        story.multiplier = 1;
        story
    }

    /// Face identifiers of Surface walls whose partner is missing or does not point back.
    pub fn check_missing_adjacencies(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for room in &self.room_2ds {
            for (i, r) in room.surface_references() {
                let reciprocal = self
                    .room_2ds
                    .find_by_name(&r.room)
                    .and_then(|other| other.segment(r.segment))
                    .and_then(|seg| seg.boundary_condition.surface_ref())
                    .is_some_and(|back| back.room == room.identifier() && back.segment == i);
                if !reciprocal {
                    missing.push(crate::boundary::wall_face_identifier(room.identifier(), i));
                }
            }
        }
        missing
    }

    /// Removes colinear vertices of every room, collecting failures.
    ///
    /// With `delete_degenerate`, rooms that become degenerate are removed
    /// (the last room of the Story is never removed). Returns `Err(Error::Batch)`
    /// if any room failed.
    pub fn remove_colinear_vertices(&mut self, tol: f64, delete_degenerate: bool) -> Result<BatchReport> {
        let mut report = BatchReport::new(&format!("remove_colinear_vertices on Story {}", self.identifier));
        let mut degenerate = Vec::new();
        for room in &mut self.room_2ds {
            if let Err(e) = room.remove_colinear_vertices(tol) {
                if delete_degenerate && e.is_degenerate() {
                    degenerate.push(room.identifier().to_string());
                } else {
                    report.record(room.identifier(), &e);
                }
            }
        }
        for id in degenerate {
            match self.remove_room_2d(&id) {
                Ok(_) => {
                    warn!("Removed degenerate Room2D {id} from Story {}", self.identifier);
                    report.removed.push(id);
                }
                Err(e) => report.record(&id, &e),
            }
        }
        info!("{report}");
        report.into_result()
    }

    /// Splits rooms partially covered by `above` along the coverage boundary.
    ///
    /// Covered pieces are not top exposed, uncovered pieces are. Pieces are
    /// named `<room>_<k>` and keep the walls matching an old wall exactly.
    /// Walls of other rooms referencing a split room are reset to Outdoors.
    pub fn split_with_story_above(&mut self, above: &Story, tol: f64) -> Result<BatchReport> {
        let mut report = BatchReport::new(&format!("split_with_story_above on Story {}", self.identifier));
        let cover: Vec<PlanShape> = plan::union(&above.room_2ds.iter().map(|r| r.plan()).collect::<Vec<_>>());
        let mut new_rooms = Vec::with_capacity(self.room_2ds.len());
        let mut split_ids = Vec::new();

        for room in &self.room_2ds {
            match split_by_cover(room, &cover, tol) {
                Ok(Coverage::Full) => {
                    let mut r = room.clone();
                    r.is_top_exposed = false;
                    new_rooms.push(r);
                }
                Ok(Coverage::None) => {
                    let mut r = room.clone();
                    r.is_top_exposed = true;
                    new_rooms.push(r);
                }
                Ok(Coverage::Partial(pieces)) => {
                    debug!("Room2D {} split into {} pieces", room.identifier(), pieces.len());
                    split_ids.push(room.identifier().to_string());
                    new_rooms.extend(pieces);
                }
                Err(e) => {
                    report.record(room.identifier(), &e);
                    new_rooms.push(room.clone());
                }
            }
        }
        let refs: Vec<&Room2D> = new_rooms.iter().collect();
        self.check_duplicates(&refs)?;
        self.room_2ds = new_rooms;
        for room in &mut self.room_2ds {
            room.parent = Some(self.uid.clone());
            for id in &split_ids {
                room.reset_adjacency_to(id);
            }
        }
        report.into_result()
    }

    /// Extrudes every room and links their shared walls.
    ///
    /// Rooms that fail to extrude are reported and left out. A Surface wall
    /// whose partner face is missing or does not point back becomes Outdoors.
    pub fn to_rooms(&self, config: &ConversionConfig) -> Conversion {
        let multiplier = if config.use_multiplier { self.multiplier } else { 1 };
        let mut conversion = Conversion {
            report: BatchReport::new(&format!("to_rooms on Story {}", self.identifier)),
            ..Default::default()
        };
        let mut deferred = Vec::new();
        let mut plenums = Vec::new();
        for room in &self.room_2ds {
            match extrude_room(room, Some(self), multiplier, config) {
                Ok(ext) => {
                    conversion.outcomes.push((room.identifier().to_string(), ext.outcome));
                    deferred.push((conversion.rooms.len(), ext.deferred));
                    conversion.rooms.push(ext.room);
                    plenums.extend(ext.plenums);
                }
                Err(e) => {
                    warn!("{e}");
                    conversion.report.record(room.identifier(), &e);
                }
            }
        }

        let mut unresolved = Vec::new();
        for (index, records) in &deferred {
            let source = &conversion.rooms[*index];
            for d in records {
                let target = conversion
                    .rooms
                    .find_by_name(&d.target_room)
                    .and_then(|r| r.face_by_identifier(&d.target_face));
                let points_back = target.is_some_and(|f| {
                    f.boundary_condition == FaceBoundary::surface(&d.face, &source.identifier)
                });
                if !points_back {
                    warn!(
                        "Face {} has no matching face {} in room {}; set to Outdoors",
                        d.face, d.target_face, d.target_room
                    );
                    unresolved.push((*index, d.face.clone()));
                }
            }
        }
        for (index, face) in unresolved {
            if let Some(f) = conversion.rooms[index].face_by_identifier_mut(&face) {
                f.boundary_condition = FaceBoundary::Outdoors;
            }
        }
        conversion.rooms.extend(plenums);
        info!(
            "Story {}: {} room(s) converted, {} failure(s)",
            self.identifier,
            conversion.rooms.len(),
            conversion.report.failures.len()
        );
        conversion
    }
}

enum Coverage {
    Full,
    None,
    Partial(Vec<Room2D>),
}

fn split_by_cover(room: &Room2D, cover: &[PlanShape], tol: f64) -> Result<Coverage> {
    let plan = room.plan();
    let min_area = plan.max_dimension() * tol;
    let uncovered: Vec<PlanShape> = plan::difference(&plan, cover)
        .into_iter()
        .filter(|s| s.area() > min_area)
        .collect();
    let uncovered_area: f64 = uncovered.iter().map(|s| s.area()).sum();
    if uncovered.is_empty() {
        return Ok(Coverage::Full);
    }
    if plan.area() - uncovered_area <= min_area {
        return Ok(Coverage::None);
    }
    let covered: Vec<PlanShape> = cover
        .iter()
        .flat_map(|c| plan::intersection(&plan, c))
        .filter(|s| s.area() > min_area)
        .collect();

    let old_edges = room.floor_segments_2d();
    let mut pieces = Vec::new();
    let parts = covered.iter().map(|s| (s, false)).chain(uncovered.iter().map(|s| (s, true)));
    for (k, (shape, exposed)) in parts.enumerate() {
        let segments = transplant_segments(
            &old_edges,
            room.segments(),
            &shape_edges(shape),
            Transplant::ExactEndpoints,
            tol,
            room.floor_to_ceiling_height(),
        );
        let mut piece = room.derive(&format!("{}_{k}", room.identifier()), shape, segments, tol)?;
        piece.is_top_exposed = exposed;
        pieces.push(piece);
    }
    Ok(Coverage::Partial(pieces))
}

/// Checks `candidates` against the median floor of `reference`.
///
/// Floors further than the smallest floor-to-ceiling height away are
/// reported as too high or too low.
fn check_floor_heights(story: &str, reference: &[&Room2D], candidates: &[&Room2D]) -> Result<()> {
    let mut floors: Vec<f64> = reference.iter().map(|r| r.floor_height()).collect();
    if floors.is_empty() {
        floors = candidates.iter().map(|r| r.floor_height()).collect();
    }
    if floors.is_empty() {
        return Ok(());
    }
    floors.sort_by(|a, b| a.total_cmp(b));
    let median = floors[floors.len() / 2];
    let limit = reference
        .iter()
        .chain(candidates.iter())
        .map(|r| r.floor_to_ceiling_height())
        .fold(f64::INFINITY, f64::min);

    let mut too_high = Vec::new();
    let mut too_low = Vec::new();
    for room in candidates {
        let diff = room.floor_height() - median;
        if diff > limit {
            too_high.push(room.identifier().to_string());
        } else if -diff > limit {
            too_low.push(room.identifier().to_string());
        }
    }
    if too_high.is_empty() && too_low.is_empty() {
        Ok(())
    } else {
        Err(Error::FloorHeightMismatch {
            story: story.to_string(),
            too_high,
            too_low,
        })
    }
}

/// Persisted form; heights are written as their effective values.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoryData {
    identifier: String,
    room_2ds: Vec<Room2D>,
    floor_to_floor_height: f64,
    floor_height: f64,
    #[serde(default = "default_multiplier")]
    multiplier: usize,
}

fn default_multiplier() -> usize {
    1
}

impl From<Story> for StoryData {
    fn from(story: Story) -> Self {
        Self {
            floor_to_floor_height: story.floor_to_floor_height(),
            floor_height: story.floor_height(),
            identifier: story.identifier,
            room_2ds: story.room_2ds,
            multiplier: story.multiplier,
        }
    }
}

impl TryFrom<StoryData> for Story {
    type Error = String;

    fn try_from(data: StoryData) -> std::result::Result<Self, Self::Error> {
        let mut story = Story::new(&data.identifier, data.room_2ds).map_err(|e| e.to_string())?;
        story.set_multiplier(data.multiplier).map_err(|e| e.to_string())?;
        // Heights equal to the computed ones stay computed.
        if !data.floor_height.is_close(story.floor_height()) {
            story.set_floor_height(Some(data.floor_height));
        }
        if !data.floor_to_floor_height.is_close(story.floor_to_floor_height()) {
            story
                .set_floor_to_floor_height(Some(data.floor_to_floor_height))
                .map_err(|e| e.to_string())?;
        }
        Ok(story)
    }
}
