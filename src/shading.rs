//! Shading parameters: instructions for generating shades on a wall segment.

use crate::geom::point::Point;
use crate::geom::polygon::Polygon;
use crate::geom::vector::Vector;
use crate::room3d::{Face, Shade, WallFrame};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Upper bound on louvers generated for one wall.
const MAX_LOUVERS: usize = 1000;

/// Angles are in degrees; positive angles tilt the shade downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShadingParameter {
    /// Fins of `depth` around every aperture.
    ExtrudedBorder { depth: f64 },
    /// A single shade of `depth` along the top of the wall.
    Overhang { depth: f64, angle: f64 },
    /// Horizontal louvers spaced `distance` apart, starting at the top of the wall.
    LouversByDistance {
        distance: f64,
        depth: f64,
        offset: f64,
        angle: f64,
    },
    /// `count` horizontal louvers spread evenly down from the top of the wall.
    LouversByCount {
        count: usize,
        depth: f64,
        offset: f64,
        angle: f64,
    },
}

impl ShadingParameter {
    pub fn validate(&self) -> Result<()> {
        let (depth, angle) = match self {
            Self::ExtrudedBorder { depth } => (*depth, 0.),
            Self::Overhang { depth, angle } => (*depth, *angle),
            Self::LouversByDistance {
                distance,
                depth,
                angle,
                ..
            } => {
                if !(*distance > 0.) {
                    return Err(anyhow!("Louver distance must be positive, got {distance}"));
                }
                (*depth, *angle)
            }
            Self::LouversByCount {
                count, depth, angle, ..
            } => {
                if *count == 0 {
                    return Err(anyhow!("Louver count must be at least 1"));
                }
                (*depth, *angle)
            }
        };
        if !(depth > 0.) {
            return Err(anyhow!("Shade depth must be positive, got {depth}"));
        }
        if !(-90. ..90.).contains(&angle) {
            return Err(anyhow!("Shade angle must be in (-90, 90) degrees, got {angle}"));
        }
        Ok(())
    }

    /// Scales the lengths of the parameter (angles and counts are unchanged).
    pub fn scale(&self, factor: f64) -> Self {
        match self {
            Self::ExtrudedBorder { depth } => Self::ExtrudedBorder { depth: depth * factor },
            Self::Overhang { depth, angle } => Self::Overhang {
                depth: depth * factor,
                angle: *angle,
            },
            Self::LouversByDistance {
                distance,
                depth,
                offset,
                angle,
            } => Self::LouversByDistance {
                distance: distance * factor,
                depth: depth * factor,
                offset: offset * factor,
                angle: *angle,
            },
            Self::LouversByCount {
                count,
                depth,
                offset,
                angle,
            } => Self::LouversByCount {
                count: *count,
                depth: depth * factor,
                offset: offset * factor,
                angle: *angle,
            },
        }
    }

    /// Generates the shades of a wall face (after its apertures were added).
    pub fn add_shading_to_face(&self, face: &mut Face, tol: f64) -> Result<()> {
        let Some(frame) = face.wall_frame() else {
            return Err(anyhow!("Face {} is not a vertical wall", face.identifier));
        };
        let polygons = match self {
            Self::ExtrudedBorder { depth } => {
                let mut fins = Vec::new();
                for aperture in &face.apertures {
                    for (p1, p2) in aperture.polygon.edges() {
                        let out = frame.basis.normal() * *depth;
                        fins.push(Polygon::new(vec![p1, p2, p2 + out, p1 + out], None)?);
                    }
                }
                fins
            }
            Self::Overhang { depth, angle } => {
                vec![louver(&frame, frame.height, *depth, 0., *angle)?]
            }
            Self::LouversByDistance {
                distance,
                depth,
                offset,
                angle,
            } => {
                let mut louvers = Vec::new();
                let mut v = frame.height;
                while v > tol && louvers.len() < MAX_LOUVERS {
                    louvers.push(louver(&frame, v, *depth, *offset, *angle)?);
                    v -= distance;
                }
                louvers
            }
            Self::LouversByCount {
                count,
                depth,
                offset,
                angle,
            } => {
                let spacing = frame.height / *count as f64;
                (0..*count)
                    .map(|i| louver(&frame, frame.height - i as f64 * spacing, *depth, *offset, *angle))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        let start = face.shades.len();
        for (i, polygon) in polygons.into_iter().enumerate() {
            face.shades.push(Shade {
                identifier: format!("{}_Shd{}", face.identifier, start + i),
                polygon,
            });
        }
        Ok(())
    }
}

/// Horizontal shade along the whole wall at height `v`, `offset` away from it.
fn louver(frame: &WallFrame, v: f64, depth: f64, offset: f64, angle: f64) -> Result<Polygon> {
    let n = frame.basis.normal();
    let a = angle.to_radians();
    let dir = n * a.cos() - Vector::up() * a.sin();
    let p1: Point = frame.basis.unproject(0., v) + n * offset;
    let p2: Point = frame.basis.unproject(frame.length, v) + n * offset;
    Polygon::new(vec![p1, p2, p2 + dir * depth, p1 + dir * depth], None)
}
