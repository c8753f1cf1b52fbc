use std::fmt;
use thiserror::Error;

/// Result type for floor-plate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by Room2D, Story, adjacency solving and extrusion.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid {object}: {reason}")]
    Construction { object: String, reason: String },

    #[error("Room2D \"{room}\" segment {segment}: {reason}")]
    InvalidBoundaryCondition {
        room: String,
        segment: usize,
        reason: String,
    },

    #[error(
        "Adjacency conflict between \"{room_a}\" segment {segment_a} and \"{room_b}\" segment {segment_b}: {reason}"
    )]
    AdjacencyConflict {
        room_a: String,
        segment_a: usize,
        room_b: String,
        segment_b: usize,
        reason: String,
    },

    #[error("Degenerate geometry in Room2D \"{room}\": {reason}")]
    DegenerateGeometry { room: String, reason: String },

    #[error("Cannot merge windows of Room2D \"{room}\" at segment {segment}: {reason}")]
    WindowMerge {
        room: String,
        segment: usize,
        reason: String,
    },

    #[error("Room2D floor heights in Story \"{story}\" do not match (too high: {too_high:?}, too low: {too_low:?})")]
    FloorHeightMismatch {
        story: String,
        too_high: Vec<String>,
        too_low: Vec<String>,
    },

    #[error("{kind} \"{identifier}\" was not found")]
    NotFound { kind: String, identifier: String },

    #[error("Failed to extrude Room2D \"{room}\": {reason}")]
    Extrusion { room: String, reason: String },

    #[error("{0}")]
    Batch(BatchReport),

    #[error("Geometry error: {0}")]
    Geometry(#[from] anyhow::Error),
}

impl Error {
    pub fn construction(object: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Construction {
            object: object.into(),
            reason: reason.to_string(),
        }
    }

    pub fn degenerate(room: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::DegenerateGeometry {
            room: room.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            identifier: identifier.into(),
        }
    }

    /// True for failures a batch caller may resolve by dropping the room.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. })
    }
}

/// One room's failure inside a batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomFailure {
    pub room: String,
    pub message: String,
    pub degenerate: bool,
}

/// Aggregated outcome of a Story- or Building-wide operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub operation: String,
    pub failures: Vec<RoomFailure>,
    /// Rooms removed because their geometry became degenerate.
    pub removed: Vec<String>,
}

impl BatchReport {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, room: &str, err: &Error) {
        self.failures.push(RoomFailure {
            room: room.to_string(),
            message: err.to_string(),
            degenerate: err.is_degenerate(),
        });
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn extend(&mut self, other: BatchReport) {
        self.failures.extend(other.failures);
        self.removed.extend(other.removed);
    }

    /// `Ok(self)` if nothing failed, otherwise `Err(Error::Batch)`.
    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::Batch(self))
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} failure(s), {} room(s) removed",
            self.operation,
            self.failures.len(),
            self.removed.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.room, failure.message)?;
        }
        Ok(())
    }
}
