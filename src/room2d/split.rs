//! Splitting a floor plate with a line and joining two plates.

use super::transplant::{Transplant, transplant_segments};
use super::{Room2D, check_degenerate};
use crate::error::{Error, Result};
use crate::geom::plan::{self, PlanShape, Point2};
use crate::geom::segment::length_2d;
use log::debug;

impl Room2D {
    /// Splits the room along the infinite line through `p1` and `p2`.
    ///
    /// Pieces are named `<identifier>_<k>`. If the line misses the room a
    /// single unchanged copy is returned. Wall attributes carry over to the
    /// parts of the original walls; the new walls along the cut are Outdoors.
    pub fn split_with_line(&self, p1: Point2, p2: Point2, tol: f64) -> Result<Vec<Room2D>> {
        let len = length_2d(p1, p2);
        if len <= tol {
            return Err(Error::construction(
                format!("split line of Room2D \"{}\"", self.identifier),
                "the two line points coincide",
            ));
        }
        let plan = self.plan();
        let d = ((p2.0 - p1.0) / len, (p2.1 - p1.1) / len);
        let left = (-d.1, d.0);
        let rect = self.bounding_rect();
        let reach = 2. * (length_2d(rect.min, rect.max) + length_2d(p1, rect.min)) + 1.;
        let half_plane = PlanShape::new(
            vec![
                (p1.0 - d.0 * reach, p1.1 - d.1 * reach),
                (p1.0 + d.0 * reach, p1.1 + d.1 * reach),
                (p1.0 + d.0 * reach + left.0 * reach, p1.1 + d.1 * reach + left.1 * reach),
                (p1.0 - d.0 * reach + left.0 * reach, p1.1 - d.1 * reach + left.1 * reach),
            ],
            vec![],
        );

        let mut pieces = plan::intersection(&plan, &half_plane);
        pieces.extend(plan::difference(&plan, std::slice::from_ref(&half_plane)));
        pieces.retain(|p| check_degenerate(&self.identifier, p, tol).is_ok());
        debug!("Split of Room2D \"{}\" produced {} piece(s)", self.identifier, pieces.len());
        if pieces.is_empty() {
            return Err(Error::degenerate(self.identifier.clone(), "the split left no valid piece"));
        }
        if pieces.len() == 1 {
            return Ok(vec![self.clone()]);
        }

        let old_edges = self.floor_segments_2d();
        pieces
            .iter()
            .enumerate()
            .map(|(k, shape)| {
                let segments = transplant_segments(
                    &old_edges,
                    &self.segments,
                    &shape_edges(shape),
                    Transplant::Subsegments,
                    tol,
                    self.floor_to_ceiling_height,
                );
                self.derive(&format!("{}_{k}", self.identifier), shape, segments, tol)
            })
            .collect()
    }

    /// Joins this room with `other` into one room.
    ///
    /// The rooms must touch so their union is a single region. The result
    /// keeps this room's identifier, heights and flags; walls of both rooms
    /// keep their attributes and the shared wall disappears.
    pub fn join(&self, other: &Room2D, tol: f64) -> Result<Room2D> {
        let union = plan::union(&[self.plan(), other.plan()]);
        let [shape] = union.as_slice() else {
            return Err(Error::construction(
                format!("join of Room2D \"{}\" and \"{}\"", self.identifier, other.identifier),
                format!("the rooms do not form one region ({} regions)", union.len()),
            ));
        };
        // Put the old vertices back on the union outline so every new edge lies on one old edge
        let mut loops: Vec<Vec<Point2>> = shape.loops().cloned().collect();
        let outline_loops = loops.len();
        let mut owners = vec![0; outline_loops];
        for (owner, room) in [(1, self), (2, other)] {
            for lp in room.plan().loops() {
                loops.push(lp.clone());
                owners.push(owner);
            }
        }
        let loops = plan::intersect_loop_segments(&loops, &owners, tol);
        let shape = PlanShape {
            boundary: loops[0].clone(),
            holes: loops[1..outline_loops].to_vec(),
        };

        let mut old_edges = self.floor_segments_2d();
        old_edges.extend(other.floor_segments_2d());
        let mut old_segments = self.segments.clone();
        old_segments.extend(other.segments.iter().cloned());
        let segments = transplant_segments(
            &old_edges,
            &old_segments,
            &shape_edges(&shape),
            Transplant::Subsegments,
            tol,
            self.floor_to_ceiling_height,
        );
        let mut joined = self.clone();
        joined.replace_geometry(&shape, segments, tol)?;
        joined.remove_colinear_vertices(tol)?;
        Ok(joined)
    }
}

/// Edges of a plan shape, boundary first.
pub(crate) fn shape_edges(shape: &PlanShape) -> Vec<(Point2, Point2)> {
    shape
        .loops()
        .flat_map(|lp| {
            let n = lp.len();
            (0..n).map(move |i| (lp[i], lp[(i + 1) % n]))
        })
        .collect()
}
