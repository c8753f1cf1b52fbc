//! Carrying wall attributes over to re-derived floor geometry.

use super::WallSegment;
use crate::geom::plan::Point2;
use crate::geom::segment::{distance_to_segment_2d, is_close_2d, length_2d, project_onto_segment_2d};

/// How a new edge may pick up the attributes of an old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transplant {
    /// Only edges with the same start and end points.
    ExactEndpoints,
    /// Also edges lying inside an old edge and running the same way.
    Subsegments,
}

/// Segments for `new_edges`, copied from the matching `old_edges`.
///
/// Unmatched edges get a default (Outdoors) segment. Matched segments are
/// [`WallSegment::detached`]: the wall geometry changed, so Surface references
/// no longer hold. Sub-segments keep ratio windows and trimmed geometric windows.
pub(crate) fn transplant_segments(
    old_edges: &[(Point2, Point2)],
    old_segments: &[WallSegment],
    new_edges: &[(Point2, Point2)],
    mode: Transplant,
    tol: f64,
    wall_height: f64,
) -> Vec<WallSegment> {
    new_edges
        .iter()
        .map(|&(a, b)| {
            let exact = old_edges
                .iter()
                .position(|&(p, q)| is_close_2d(a, p, tol) && is_close_2d(b, q, tol));
            if let Some(i) = exact {
                return old_segments[i].detached();
            }
            if mode == Transplant::Subsegments
                && let Some(i) = old_edges.iter().position(|&(p, q)| contains_edge(p, q, a, b, tol))
            {
                return subsegment(&old_segments[i], old_edges[i], (a, b), wall_height);
            }
            WallSegment::default()
        })
        .collect()
}

/// Checks whether `a -> b` lies on `p -> q` and runs in the same direction.
fn contains_edge(p: Point2, q: Point2, a: Point2, b: Point2, tol: f64) -> bool {
    if distance_to_segment_2d(a, p, q) > tol || distance_to_segment_2d(b, p, q) > tol {
        return false;
    }
    let same_way = (q.0 - p.0) * (b.0 - a.0) + (q.1 - p.1) * (b.1 - a.1);
    same_way > 0. && length_2d(a, b) > tol
}

fn subsegment(old: &WallSegment, (p, q): (Point2, Point2), (a, b): (Point2, Point2), wall_height: f64) -> WallSegment {
    let mut seg = old.detached();
    let (ta, len) = project_onto_segment_2d(a, p, q);
    let (tb, _) = project_onto_segment_2d(b, p, q);
    let start = ta.clamp(0., 1.) * len;
    let end = tb.clamp(0., 1.) * len;
    seg.window_parameter = old
        .window_parameter
        .as_ref()
        .and_then(|w| w.trim(start, end, len, wall_height));
    seg
}
