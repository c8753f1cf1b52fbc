use serde::{Deserialize, Serialize};

/// Numeric tolerances used by geometric matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Distance in model units below which points are considered coincident.
    pub distance: f64,
    /// Angle in degrees below which directions are considered parallel.
    pub angle_degrees: f64,
}

impl Tolerance {
    pub fn new() -> Self {
        Self {
            distance: 0.01,
            angle_degrees: 1.0,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn angle_radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new()
    }
}

/// Policy for a newly discovered shared wall whose two sides carry different windows.
///
/// The "keep the larger window" heuristic has no correctness argument behind it,
/// so it must be requested explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowConflictPolicy {
    /// Fail with an adjacency conflict naming both rooms and segments.
    #[default]
    Strict,
    /// Copy the window with the larger area onto the other side.
    ResolveLargerArea,
}

/// Configuration for converting Room2Ds into 3D rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub tolerance: Tolerance,
    /// Pass the Story multiplier to the rooms instead of writing every repeat.
    pub use_multiplier: bool,
    pub window_conflict: WindowConflictPolicy,
    /// Return invalid solids as-is (flagged) instead of forcing a solid.
    pub diagnostic: bool,
    /// Fill the gap between a room and its Story's floor-to-floor span with plenums.
    pub add_plenums: bool,
    /// Split walls where adjacent rooms have different floor or ceiling heights.
    pub split_walls: bool,
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
            use_multiplier: true,
            window_conflict: WindowConflictPolicy::default(),
            diagnostic: false,
            add_plenums: false,
            split_walls: true,
        }
    }

    pub fn with_tolerance(mut self, distance: f64) -> Self {
        self.tolerance.distance = distance;
        self
    }

    pub fn with_use_multiplier(mut self, use_multiplier: bool) -> Self {
        self.use_multiplier = use_multiplier;
        self
    }

    pub fn with_window_conflict(mut self, policy: WindowConflictPolicy) -> Self {
        self.window_conflict = policy;
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: bool) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn with_plenums(mut self, add_plenums: bool) -> Self {
        self.add_plenums = add_plenums;
        self
    }

    pub fn with_split_walls(mut self, split_walls: bool) -> Self {
        self.split_walls = split_walls;
        self
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert_eq!(config.tolerance.distance, 0.01);
        assert_eq!(config.window_conflict, WindowConflictPolicy::Strict);
        assert!(config.use_multiplier);
        assert!(config.split_walls);
        assert!(!config.add_plenums);
    }

    #[test]
    fn test_builder_and_serde() {
        let config = ConversionConfig::new()
            .with_tolerance(0.001)
            .with_window_conflict(WindowConflictPolicy::ResolveLargerArea)
            .with_plenums(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: ConversionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.tolerance.distance, 0.001);
    }
}
