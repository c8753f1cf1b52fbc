//! Removal of duplicate and colinear floor vertices.

use super::{Room2D, WallSegment};
use crate::error::{Error, Result};
use crate::geom::plan::{PlanShape, Point2};
use crate::geom::segment::{is_close_2d, is_colinear_2d, length_2d};

/// One polygon loop with the segments of its edges.
type Loop = (Vec<Point2>, Vec<WallSegment>);

impl Room2D {
    /// Removes vertices closer than `tol` to the previous one.
    ///
    /// The zero-length edge and its segment are dropped. Holes that collapse
    /// are removed; a collapsing boundary is a degenerate-geometry error and
    /// leaves the room unchanged.
    pub fn remove_duplicate_vertices(&mut self, tol: f64) -> Result<()> {
        let loops = self
            .split_loops()
            .into_iter()
            .map(|lp| dedupe_loop(lp, tol))
            .collect();
        self.commit_loops(loops, tol)
    }

    /// Removes duplicate vertices, then vertices lying on the line between their neighbors.
    ///
    /// The two segments meeting at a removed vertex are merged (see
    /// [`WallSegment::merge`]); windows that cannot be merged fail with
    /// [`Error::WindowMerge`] and leave the room unchanged.
    pub fn remove_colinear_vertices(&mut self, tol: f64) -> Result<()> {
        let height = self.floor_to_ceiling_height;
        let mut offset = 0;
        let mut loops = Vec::new();
        for lp in self.split_loops() {
            let original_len = lp.0.len();
            let (pts, segs) = dedupe_loop(lp, tol);
            let merged = merge_colinear(pts, segs, tol, height).map_err(|(k, reason)| Error::WindowMerge {
                room: self.identifier.clone(),
                segment: offset + k,
                reason,
            })?;
            loops.push(merged);
            offset += original_len;
        }
        self.commit_loops(loops, tol)
    }

    fn split_loops(&self) -> Vec<Loop> {
        let plan = self.plan();
        let mut offset = 0;
        plan.loops()
            .map(|pts| {
                let segs = self.segments[offset..offset + pts.len()].to_vec();
                offset += pts.len();
                (pts.clone(), segs)
            })
            .collect()
    }

    fn commit_loops(&mut self, mut loops: Vec<Loop>, tol: f64) -> Result<()> {
        if loops.is_empty() {
            return Err(Error::degenerate(self.identifier.clone(), "no boundary loop"));
        }
        let (boundary, mut segments) = loops.remove(0);
        let mut holes = Vec::new();
        for (pts, segs) in loops {
            if pts.len() >= 3 {
                holes.push(pts);
                segments.extend(segs);
            }
        }
        let shape = PlanShape { boundary, holes };
        self.replace_geometry(&shape, segments, tol)
    }
}

fn dedupe_loop((pts, segs): Loop, tol: f64) -> Loop {
    let n = pts.len();
    let mut out_pts = Vec::with_capacity(n);
    let mut out_segs = Vec::with_capacity(n);
    for k in 0..n {
        if !is_close_2d(pts[k], pts[(k + 1) % n], tol) {
            out_pts.push(pts[k]);
            out_segs.push(segs[k].clone());
        }
    }
    (out_pts, out_segs)
}

/// Merges colinear runs. On failure returns the loop-local segment index.
fn merge_colinear(
    mut pts: Vec<Point2>,
    mut segs: Vec<WallSegment>,
    tol: f64,
    height: f64,
) -> std::result::Result<Loop, (usize, String)> {
    let mut changed = true;
    while changed && pts.len() > 3 {
        changed = false;
        let n = pts.len();
        for k in 0..n {
            let prev = (k + n - 1) % n;
            let next = (k + 1) % n;
            if !is_colinear_2d(pts[prev], pts[k], pts[next], tol) {
                continue;
            }
            let len_a = length_2d(pts[prev], pts[k]);
            let len_b = length_2d(pts[k], pts[next]);
            segs[prev] = WallSegment::merge(&segs[prev], len_a, &segs[k], len_b, height).map_err(|e| (prev, e))?;
            pts.remove(k);
            segs.remove(k);
            changed = true;
            break;
        }
    }
    Ok((pts, segs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryCondition;
    use crate::geom::IsClose;
    use crate::windows::WindowParameter;

    fn room_with(points: &[Point2]) -> Room2D {
        Room2D::from_vertices("R", points, &[], 0., 3.).unwrap()
    }

    #[test]
    fn test_remove_duplicate_vertices() {
        let mut room = room_with(&[(0., 0.), (5., 0.), (5.001, 0.), (5., 5.), (0., 5.)]);
        room.set_boundary_condition(4, BoundaryCondition::Ground).unwrap();
        room.remove_duplicate_vertices(0.01).unwrap();
        assert_eq!(room.segment_count(), 4);
        assert_eq!(room.floor_geometry().edge_count(), 4);
        // The wall (0, 5) -> (0, 0) is still Ground
        assert_eq!(room.segments()[3].boundary_condition, BoundaryCondition::Ground);
    }

    #[test]
    fn test_remove_colinear_vertices_merges_segments() {
        let mut room = room_with(&[(0., 0.), (4., 0.), (10., 0.), (10., 5.), (0., 5.)]);
        room.set_boundary_condition(0, BoundaryCondition::Ground).unwrap();
        room.set_window_parameter(4, Some(WindowParameter::simple_ratio(0.3).unwrap()))
            .unwrap();
        room.remove_colinear_vertices(0.01).unwrap();
        assert_eq!(room.segment_count(), 4);
        let south = room
            .floor_segments_2d()
            .iter()
            .position(|&(a, b)| a.1.is_close(0.) && b.1.is_close(0.))
            .unwrap();
        assert_eq!(room.segments()[south].boundary_condition, BoundaryCondition::Ground);
        assert!(room.segment_length(south).unwrap().is_close(10.));
        assert!(room.floor_area().is_close(50.));
        assert_eq!(room.segments().iter().filter(|s| s.window_parameter.is_some()).count(), 1);
    }

    #[test]
    fn test_colinear_window_merge() {
        let mut room = room_with(&[(0., 0.), (5., 0.), (10., 0.), (10., 5.), (0., 5.)]);
        room.set_window_parameter(0, Some(WindowParameter::simple_ratio(0.4).unwrap()))
            .unwrap();
        room.remove_colinear_vertices(0.01).unwrap();
        let windows: Vec<_> = room.segments().iter().filter_map(|s| s.window_parameter.clone()).collect();
        assert_eq!(windows, vec![WindowParameter::SimpleWindowRatio { ratio: 0.2 }]);
    }

    #[test]
    fn test_colinear_window_merge_failure_is_atomic() {
        let mut room = room_with(&[(0., 0.), (5., 0.), (10., 0.), (10., 5.), (0., 5.)]);
        room.set_window_parameter(0, Some(WindowParameter::simple_ratio(0.4).unwrap()))
            .unwrap();
        room.set_window_parameter(1, Some(WindowParameter::single_window(1., 1., 1.).unwrap()))
            .unwrap();
        let err = room.remove_colinear_vertices(0.01).unwrap_err();
        assert!(matches!(err, Error::WindowMerge { segment: 0, .. }));
        assert_eq!(room.segment_count(), 5);
    }

    #[test]
    fn test_degenerate_result() {
        let mut room = room_with(&[(0., 0.), (10., 0.), (10., 0.005), (0., 0.005)]);
        let err = room.remove_colinear_vertices(0.01).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(room.segment_count(), 4);
    }
}
