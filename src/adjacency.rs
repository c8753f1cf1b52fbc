//! Discovery of shared walls between Room2Ds.
//!
//! Rooms are scanned in slice order and segments in edge order; the first
//! eligible match of a segment wins.

use crate::boundary::BoundaryCondition;
use crate::config::WindowConflictPolicy;
use crate::error::{Error, Result};
use crate::geom::plan::{self, PlanShape, Point2};
use crate::geom::segment::{distance_to_segment_2d, length_2d};
use crate::room2d::WallSegment;
use crate::room2d::split::shape_edges;
use crate::room2d::transplant::{Transplant, transplant_segments};
use crate::room2d::Room2D;
use crate::windows::WindowParameter;
use log::{debug, warn};

/// A matched pair of wall segments, by position in the solved slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyRecord {
    pub room_a: usize,
    pub segment_a: usize,
    pub room_b: usize,
    pub segment_b: usize,
}

/// Finds coincident walls and sets both sides to Surface references of each other.
///
/// Segments already carrying a Surface condition are skipped, so solving twice
/// adds nothing. Differing windows on a matched pair fail with
/// [`Error::AdjacencyConflict`] unless `policy` allows keeping the larger one.
pub fn solve_adjacency(
    rooms: &mut [Room2D],
    tol: f64,
    policy: WindowConflictPolicy,
) -> Result<Vec<AdjacencyRecord>> {
    let rects: Vec<_> = rooms.iter().map(|r| r.bounding_rect()).collect();
    let edges: Vec<Vec<(Point2, Point2)>> = rooms.iter().map(|r| r.floor_segments_2d()).collect();
    let mut records = Vec::new();

    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            if !rects[i].overlaps(&rects[j], tol) {
                debug!(
                    "Skipping {} / {}: bounding rectangles do not overlap",
                    rooms[i].identifier(),
                    rooms[j].identifier()
                );
                continue;
            }
            let (head, tail) = rooms.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);

            for (si, &(a1, a2)) in edges[i].iter().enumerate() {
                if a.segments()[si].boundary_condition.is_surface() {
                    continue;
                }
                for (sj, &(b1, b2)) in edges[j].iter().enumerate() {
                    if b.segments()[sj].boundary_condition.is_surface() {
                        continue;
                    }
                    if !segments_coincide((a1, a2), (b1, b2), tol) {
                        continue;
                    }
                    let len = length_2d(a1, a2);
                    let (window_a, window_b) = reconcile_windows(a, si, b, sj, len, policy)?;
                    a.set_boundary_condition(si, BoundaryCondition::surface(b.identifier(), sj))?;
                    b.set_boundary_condition(sj, BoundaryCondition::surface(a.identifier(), si))?;
                    a.set_window_parameter(si, window_a)?;
                    b.set_window_parameter(sj, window_b)?;
                    debug!(
                        "Matched {} segment {si} with {} segment {sj}",
                        a.identifier(),
                        b.identifier()
                    );
                    records.push(AdjacencyRecord {
                        room_a: i,
                        segment_a: si,
                        room_b: j,
                        segment_b: sj,
                    });
                    break;
                }
            }
        }
    }
    Ok(records)
}

/// Both endpoints of `b` lie on `a` and the two have the same length.
fn segments_coincide(a: (Point2, Point2), b: (Point2, Point2), tol: f64) -> bool {
    distance_to_segment_2d(b.0, a.0, a.1) <= tol
        && distance_to_segment_2d(b.1, a.0, a.1) <= tol
        && (length_2d(a.0, a.1) - length_2d(b.0, b.1)).abs() <= tol
}

/// Windows seen from both sides of a shared wall.
///
/// The two sides run in opposite directions, so detailed windows match when
/// one is the mirror of the other.
fn reconcile_windows(
    a: &Room2D,
    si: usize,
    b: &Room2D,
    sj: usize,
    len: f64,
    policy: WindowConflictPolicy,
) -> Result<(Option<WindowParameter>, Option<WindowParameter>)> {
    let wa = a.segments()[si].window_parameter.clone();
    let wb = b.segments()[sj].window_parameter.clone();
    let mirrored_b = wb.as_ref().map(|w| w.flip(len));
    if wa == wb || wa == mirrored_b {
        return Ok((wa, wb));
    }
    match policy {
        WindowConflictPolicy::Strict => Err(Error::AdjacencyConflict {
            room_a: a.identifier().to_string(),
            segment_a: si,
            room_b: b.identifier().to_string(),
            segment_b: sj,
            reason: "the two sides have different window parameters".to_string(),
        }),
        WindowConflictPolicy::ResolveLargerArea => {
            let area = |w: &Option<WindowParameter>, h: f64| w.as_ref().map_or(0., |w| w.area_from_segment(len, h));
            let area_a = area(&wa, a.floor_to_ceiling_height());
            let area_b = area(&wb, b.floor_to_ceiling_height());
            warn!(
                "Window conflict between {} segment {si} and {} segment {sj} resolved by keeping the larger window",
                a.identifier(),
                b.identifier()
            );
            if area_a >= area_b {
                let flipped = wa.as_ref().map(|w| w.flip(len));
                Ok((wa, flipped))
            } else {
                Ok((mirrored_b, wb))
            }
        }
    }
}

/// Intersects the floor plates with each other so that walls sharing a
/// boundary also share vertices.
///
/// Rooms whose outline gains vertices are rebuilt with Outdoors walls. With
/// `preserve_exterior`, new walls identical to an old wall keep its attributes
/// (Surface references excepted). Walls of other rooms that referenced a
/// rebuilt room are reset to Outdoors. Returns the indices of rebuilt rooms.
pub fn intersect_adjacency(rooms: &mut [Room2D], tol: f64, preserve_exterior: bool) -> Result<Vec<usize>> {
    let plans: Vec<PlanShape> = rooms.iter().map(|r| r.plan()).collect();
    let mut loops = Vec::new();
    let mut owners = Vec::new();
    for (i, p) in plans.iter().enumerate() {
        for lp in p.loops() {
            loops.push(lp.clone());
            owners.push(i);
        }
    }
    let intersected = plan::intersect_loop_segments(&loops, &owners, tol);

    let mut rebuilt: Vec<(usize, Room2D)> = Vec::new();
    let mut cursor = 0;
    for (i, p) in plans.iter().enumerate() {
        let count = 1 + p.holes.len();
        let new_loops = &intersected[cursor..cursor + count];
        cursor += count;
        let unchanged = new_loops.iter().zip(p.loops()).all(|(n, o)| n.len() == o.len());
        if unchanged {
            continue;
        }
        let room = &rooms[i];
        let shape = PlanShape {
            boundary: new_loops[0].clone(),
            holes: new_loops[1..].to_vec(),
        };
        let new_edges = shape_edges(&shape);
        let segments = if preserve_exterior {
            transplant_segments(
                &room.floor_segments_2d(),
                room.segments(),
                &new_edges,
                Transplant::ExactEndpoints,
                tol,
                room.floor_to_ceiling_height(),
            )
        } else {
            vec![WallSegment::default(); new_edges.len()]
        };
        let mut updated = room.clone();
        updated.replace_geometry(&shape, segments, tol)?;
        debug!(
            "Intersected Room2D {}: {} -> {} segments",
            room.identifier(),
            room.segment_count(),
            updated.segment_count()
        );
        rebuilt.push((i, updated));
    }

    let changed: Vec<usize> = rebuilt.iter().map(|(i, _)| *i).collect();
    for (i, room) in rebuilt {
        rooms[i] = room;
    }
    for &i in &changed {
        let id = rooms[i].identifier().to_string();
        for room in rooms.iter_mut() {
            room.reset_adjacency_to(&id);
        }
    }
    Ok(changed)
}
