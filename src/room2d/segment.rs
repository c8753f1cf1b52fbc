use crate::boundary::BoundaryCondition;
use crate::shading::ShadingParameter;
use crate::windows::WindowParameter;

/// Attributes of one wall segment (one floor polygon edge).
///
/// Keeping the four attributes in one struct means structural edits of the
/// floor polygon can only move them together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WallSegment {
    pub boundary_condition: BoundaryCondition,
    pub window_parameter: Option<WindowParameter>,
    pub shading_parameter: Option<ShadingParameter>,
    pub air_boundary: bool,
}

impl WallSegment {
    pub fn new(boundary_condition: BoundaryCondition) -> Self {
        Self {
            boundary_condition,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window: WindowParameter) -> Self {
        self.window_parameter = Some(window);
        self
    }

    pub fn with_shading(mut self, shading: ShadingParameter) -> Self {
        self.shading_parameter = Some(shading);
        self
    }

    /// Checks the window/boundary-condition/air-boundary pairing rules.
    pub fn check(&self) -> Result<(), String> {
        if let Some(window) = &self.window_parameter {
            if !self.boundary_condition.allows_windows() {
                return Err(format!(
                    "a window cannot sit on a wall with a {} boundary condition",
                    self.boundary_condition
                ));
            }
            window.validate().map_err(|e| e.to_string())?;
        }
        if let Some(shading) = &self.shading_parameter {
            shading.validate().map_err(|e| e.to_string())?;
        }
        if self.air_boundary {
            if !self.boundary_condition.is_surface() {
                return Err("an air boundary needs a Surface boundary condition".to_string());
            }
            if self.window_parameter.is_some() {
                return Err("an air boundary cannot have a window".to_string());
            }
        }
        Ok(())
    }

    /// Copy of the segment for geometry that no longer matches its neighbor.
    ///
    /// Surface references become Outdoors and the air boundary flag is cleared.
    pub fn detached(&self) -> Self {
        let boundary_condition = match &self.boundary_condition {
            BoundaryCondition::Surface(_) => BoundaryCondition::Outdoors,
            other => other.clone(),
        };
        Self {
            boundary_condition,
            window_parameter: self.window_parameter.clone(),
            shading_parameter: self.shading_parameter.clone(),
            air_boundary: false,
        }
    }

    /// Segment produced by merging two consecutive colinear segments.
    pub fn merge(a: &Self, len_a: f64, b: &Self, len_b: f64, wall_height: f64) -> Result<Self, String> {
        let boundary_condition = BoundaryCondition::merge(&a.boundary_condition, &b.boundary_condition);
        let window_parameter = WindowParameter::merge(
            a.window_parameter.as_ref(),
            len_a,
            b.window_parameter.as_ref(),
            len_b,
            wall_height,
        )?;
        if window_parameter.is_some() && !boundary_condition.allows_windows() {
            return Err(format!(
                "the merged wall is {boundary_condition} and cannot keep its windows"
            ));
        }
        Ok(Self {
            boundary_condition,
            window_parameter,
            shading_parameter: a.shading_parameter.clone().or_else(|| b.shading_parameter.clone()),
            air_boundary: false,
        })
    }
}
