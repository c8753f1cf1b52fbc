//! Persisted form of a Room2D.

use super::{Room2D, WallSegment, orient_holes};
use crate::boundary::BoundaryCondition;
use crate::geom::plan::Point2;
use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::shading::ShadingParameter;
use crate::windows::WindowParameter;
use serde::{Deserialize, Serialize};

/// Flat point lists plus one array per segment attribute, in boundary-then-hole edge order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct Room2DData {
    identifier: String,
    floor_boundary: Vec<Point2>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    floor_holes: Vec<Vec<Point2>>,
    floor_height: f64,
    floor_to_ceiling_height: f64,
    boundary_conditions: Vec<BoundaryCondition>,
    window_parameters: Vec<Option<WindowParameter>>,
    shading_parameters: Vec<Option<ShadingParameter>>,
    air_boundaries: Vec<bool>,
    #[serde(default)]
    is_ground_contact: bool,
    #[serde(default)]
    is_top_exposed: bool,
}

impl From<Room2D> for Room2DData {
    fn from(room: Room2D) -> Self {
        let floor_height = room.floor_height();
        let plan = room.plan();
        let mut boundary_conditions = Vec::with_capacity(room.segments.len());
        let mut window_parameters = Vec::with_capacity(room.segments.len());
        let mut shading_parameters = Vec::with_capacity(room.segments.len());
        let mut air_boundaries = Vec::with_capacity(room.segments.len());
        for seg in room.segments {
            boundary_conditions.push(seg.boundary_condition);
            window_parameters.push(seg.window_parameter);
            shading_parameters.push(seg.shading_parameter);
            air_boundaries.push(seg.air_boundary);
        }
        Self {
            identifier: room.identifier,
            floor_boundary: plan.boundary,
            floor_holes: plan.holes,
            floor_height,
            floor_to_ceiling_height: room.floor_to_ceiling_height,
            boundary_conditions,
            window_parameters,
            shading_parameters,
            air_boundaries,
            is_ground_contact: room.is_ground_contact,
            is_top_exposed: room.is_top_exposed,
        }
    }
}

impl TryFrom<Room2DData> for Room2D {
    type Error = String;

    fn try_from(data: Room2DData) -> Result<Self, Self::Error> {
        let n = data.boundary_conditions.len();
        if data.window_parameters.len() != n || data.shading_parameters.len() != n || data.air_boundaries.len() != n {
            return Err(format!(
                "Room2D \"{}\" has per-segment arrays of different lengths",
                data.identifier
            ));
        }
        let lift = |pts: &[Point2]| {
            pts.iter()
                .map(|&(x, y)| Point::new(x, y, data.floor_height))
                .collect::<Vec<_>>()
        };
        let segments: Vec<WallSegment> = data
            .boundary_conditions
            .into_iter()
            .zip(data.window_parameters)
            .zip(data.shading_parameters)
            .zip(data.air_boundaries)
            .map(|(((boundary_condition, window_parameter), shading_parameter), air_boundary)| WallSegment {
                boundary_condition,
                window_parameter,
                shading_parameter,
                air_boundary,
            })
            .collect();
        let (holes, segments) = orient_holes(&data.floor_boundary, &data.floor_holes, segments);
        let floor = Polygon::with_holes(
            lift(&data.floor_boundary),
            holes.iter().map(|h| lift(h)).collect(),
            None,
        )
        .map_err(|e| format!("Room2D \"{}\": {e}", data.identifier))?;
        let mut room = Room2D::new(&data.identifier, floor, data.floor_to_ceiling_height, segments)
            .map_err(|e| e.to_string())?;
        room.is_ground_contact = data.is_ground_contact;
        room.is_top_exposed = data.is_top_exposed;
        Ok(room)
    }
}
