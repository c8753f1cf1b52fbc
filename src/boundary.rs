//! Wall boundary conditions.
//!
//! Adjacency is stored structurally as a [`SurfaceRef`] (room identifier plus
//! wall segment index). The `"<room>..Face<n>"` string form only exists at the
//! serialization boundary and in the 3D output.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Face identifier of the `n`-th face of a room (0 is the floor, `k + 1` is wall `k`).
pub fn face_identifier(room: &str, face_index: usize) -> String {
    format!("{room}..Face{face_index}")
}

/// Face identifier of wall segment `segment` of `room`.
pub fn wall_face_identifier(room: &str, segment: usize) -> String {
    face_identifier(room, segment + 1)
}

/// Splits `"<room>..Face<n>"` into the room identifier and face index.
pub fn parse_face_identifier(face: &str) -> Result<(String, usize)> {
    let (room, index) = face
        .rsplit_once("..Face")
        .ok_or_else(|| anyhow!("Face identifier must look like '<room>..Face<n>': {face}"))?;
    if room.is_empty() {
        return Err(anyhow!("Face identifier has an empty room: {face}"));
    }
    let index: usize = index
        .parse()
        .map_err(|_| anyhow!("Face identifier has an invalid index: {face}"))?;
    Ok((room.to_string(), index))
}

/// Reference to a wall segment of another Room2D.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceRef {
    pub room: String,
    pub segment: usize,
}

impl SurfaceRef {
    pub fn new(room: &str, segment: usize) -> Self {
        Self {
            room: room.to_string(),
            segment,
        }
    }

    /// `"<room>..Face<segment + 1>"`
    pub fn face_identifier(&self) -> String {
        wall_face_identifier(&self.room, self.segment)
    }
}

/// Boundary condition of a wall segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "BoundaryConditionData", into = "BoundaryConditionData")]
pub enum BoundaryCondition {
    #[default]
    Outdoors,
    Ground,
    Adiabatic,
    Surface(SurfaceRef),
}

impl BoundaryCondition {
    pub fn surface(room: &str, segment: usize) -> Self {
        Self::Surface(SurfaceRef::new(room, segment))
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, Self::Surface(_))
    }

    pub fn is_outdoors(&self) -> bool {
        matches!(self, Self::Outdoors)
    }

    pub fn surface_ref(&self) -> Option<&SurfaceRef> {
        match self {
            Self::Surface(r) => Some(r),
            _ => None,
        }
    }

    /// Whether a window may sit on a wall with this condition.
    pub fn allows_windows(&self) -> bool {
        matches!(self, Self::Outdoors | Self::Surface(_))
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Ground => 3,
            Self::Adiabatic => 2,
            Self::Surface(_) => 1,
            Self::Outdoors => 0,
        }
    }

    /// Condition of the segment obtained by merging two colinear segments.
    ///
    /// Ground wins over Adiabatic, which wins over Outdoors. Surface references
    /// cannot survive a merge (the wall they point at no longer exists) and
    /// become Outdoors.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let winner = if a.rank() >= b.rank() { a } else { b };
        match winner {
            Self::Surface(_) => Self::Outdoors,
            other => other.clone(),
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outdoors => f.write_str("Outdoors"),
            Self::Ground => f.write_str("Ground"),
            Self::Adiabatic => f.write_str("Adiabatic"),
            Self::Surface(r) => write!(f, "Surface({})", r.face_identifier()),
        }
    }
}

/// Wire form of a boundary condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum BoundaryConditionData {
    Outdoors,
    Ground,
    Adiabatic,
    Surface {
        /// `["<room>..Face<n>", "<room>"]`
        boundary_condition_objects: Vec<String>,
    },
}

impl From<BoundaryCondition> for BoundaryConditionData {
    fn from(bc: BoundaryCondition) -> Self {
        match bc {
            BoundaryCondition::Outdoors => Self::Outdoors,
            BoundaryCondition::Ground => Self::Ground,
            BoundaryCondition::Adiabatic => Self::Adiabatic,
            BoundaryCondition::Surface(r) => Self::Surface {
                boundary_condition_objects: vec![r.face_identifier(), r.room],
            },
        }
    }
}

impl TryFrom<BoundaryConditionData> for BoundaryCondition {
    type Error = String;

    fn try_from(data: BoundaryConditionData) -> std::result::Result<Self, Self::Error> {
        match data {
            BoundaryConditionData::Outdoors => Ok(Self::Outdoors),
            BoundaryConditionData::Ground => Ok(Self::Ground),
            BoundaryConditionData::Adiabatic => Ok(Self::Adiabatic),
            BoundaryConditionData::Surface {
                boundary_condition_objects,
            } => {
                let face = boundary_condition_objects
                    .first()
                    .ok_or("Surface boundary condition has no objects")?;
                let (room, index) = parse_face_identifier(face).map_err(|e| e.to_string())?;
                if index == 0 {
                    return Err(format!("Surface boundary condition must reference a wall: {face}"));
                }
                if let Some(last) = boundary_condition_objects.last()
                    && boundary_condition_objects.len() > 1
                    && *last != room
                {
                    return Err(format!("Surface face {face} does not belong to room {last}"));
                }
                Ok(Self::surface(&room, index - 1))
            }
        }
    }
}
