//! Window parameters: instructions for generating windows on a wall segment.
//!
//! Window geometry is produced in wall-local coordinates `(u, v)`: `u` runs
//! along the segment from its start point, `v` is the height above the bottom
//! of the wall. [`crate::geom::projection::PlaneBasis::for_wall`] maps it to 3D.

use crate::geom::plan::{Point2, signed_area};
use crate::room3d::{Aperture, Face};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WindowParameter {
    /// One rectangular window centered on the wall.
    SingleWindow {
        width: f64,
        height: f64,
        sill_height: f64,
    },
    /// One window, centered and scaled from the wall, covering `ratio` of its area.
    SimpleWindowRatio { ratio: f64 },
    /// Windows repeated along the wall in bays, covering `ratio` of its area.
    RepeatingWindowRatio {
        ratio: f64,
        window_height: f64,
        sill_height: f64,
        horizontal_separation: f64,
        vertical_separation: f64,
    },
    /// Explicit window polygons in wall-local coordinates.
    DetailedWindows { polygons: Vec<Vec<Point2>> },
}

impl WindowParameter {
    pub fn single_window(width: f64, height: f64, sill_height: f64) -> Result<Self> {
        let p = Self::SingleWindow {
            width,
            height,
            sill_height,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn simple_ratio(ratio: f64) -> Result<Self> {
        let p = Self::SimpleWindowRatio { ratio };
        p.validate()?;
        Ok(p)
    }

    pub fn repeating_ratio(
        ratio: f64,
        window_height: f64,
        sill_height: f64,
        horizontal_separation: f64,
        vertical_separation: f64,
    ) -> Result<Self> {
        let p = Self::RepeatingWindowRatio {
            ratio,
            window_height,
            sill_height,
            horizontal_separation,
            vertical_separation,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn detailed(polygons: Vec<Vec<Point2>>) -> Result<Self> {
        let p = Self::DetailedWindows { polygons };
        p.validate()?;
        Ok(p)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0. {
                Ok(())
            } else {
                Err(anyhow!("Window {name} must be a non-negative number, got {v}"))
            }
        };
        let ratio_ok = |r: f64| {
            if (0. ..1.).contains(&r) {
                Ok(())
            } else {
                Err(anyhow!("Window ratio must be in [0, 1), got {r}"))
            }
        };
        match self {
            Self::SingleWindow {
                width,
                height,
                sill_height,
            } => {
                non_negative("width", *width)?;
                non_negative("height", *height)?;
                non_negative("sill height", *sill_height)
            }
            Self::SimpleWindowRatio { ratio } => ratio_ok(*ratio),
            Self::RepeatingWindowRatio {
                ratio,
                window_height,
                sill_height,
                horizontal_separation,
                vertical_separation,
            } => {
                ratio_ok(*ratio)?;
                non_negative("height", *window_height)?;
                non_negative("sill height", *sill_height)?;
                non_negative("horizontal separation", *horizontal_separation)?;
                non_negative("vertical separation", *vertical_separation)
            }
            Self::DetailedWindows { polygons } => {
                for poly in polygons {
                    if poly.len() < 3 {
                        return Err(anyhow!("Detailed window polygon needs at least 3 vertices"));
                    }
                    if poly.iter().any(|p| p.1 < 0.) {
                        return Err(anyhow!("Detailed window polygon lies below the wall"));
                    }
                }
                Ok(())
            }
        }
    }

    /// Ratio-based parameters adapt to any segment length.
    pub fn is_ratio_based(&self) -> bool {
        matches!(
            self,
            Self::SimpleWindowRatio { .. } | Self::RepeatingWindowRatio { .. }
        )
    }

    /// Window polygons in wall-local coordinates for a wall of the given size.
    ///
    /// Windows are kept at least `tol` away from the wall edges.
    pub fn polygons(&self, seg_length: f64, wall_height: f64, tol: f64) -> Vec<Vec<Point2>> {
        if seg_length <= 2. * tol || wall_height <= 2. * tol {
            return Vec::new();
        }
        match self {
            Self::SingleWindow {
                width,
                height,
                sill_height,
            } => {
                let w = width.min(seg_length - 2. * tol);
                let h = height.min(wall_height - sill_height - tol);
                if w <= 0. || h <= 0. {
                    return Vec::new();
                }
                let u0 = (seg_length - w) / 2.;
                vec![rectangle(u0, *sill_height, w, h)]
            }
            Self::SimpleWindowRatio { ratio } => {
                if *ratio <= 0. {
                    return Vec::new();
                }
                let scale = ratio.sqrt();
                let w = seg_length * scale;
                let h = wall_height * scale;
                vec![rectangle((seg_length - w) / 2., (wall_height - h) / 2., w, h)]
            }
            Self::RepeatingWindowRatio {
                ratio,
                window_height,
                sill_height,
                horizontal_separation,
                vertical_separation,
            } => repeating_polygons(
                seg_length,
                wall_height,
                tol,
                *ratio,
                *window_height,
                *sill_height,
                *horizontal_separation,
                *vertical_separation,
            ),
            Self::DetailedWindows { polygons } => polygons
                .iter()
                .filter(|poly| {
                    poly.iter()
                        .all(|&(u, v)| u >= -tol && u <= seg_length + tol && v >= -tol && v <= wall_height + tol)
                })
                .cloned()
                .collect(),
        }
    }

    /// Total window area on a segment of the given length and height.
    pub fn area_from_segment(&self, seg_length: f64, wall_height: f64) -> f64 {
        self.polygons(seg_length, wall_height, 0.)
            .iter()
            .map(|p| signed_area(p).abs())
            .sum()
    }

    /// Generates the window apertures on a wall face.
    pub fn add_windows_to_face(&self, face: &mut Face, tol: f64) -> Result<()> {
        let Some(frame) = face.wall_frame() else {
            return Err(anyhow!("Face {} is not a vertical wall", face.identifier));
        };
        let start = face.apertures.len();
        for (i, poly) in self.polygons(frame.length, frame.height, tol).iter().enumerate() {
            let aperture = Aperture::from_wall_local(
                &format!("{}_Glz{}", face.identifier, start + i),
                &frame.basis,
                poly,
            )?;
            face.apertures.push(aperture);
        }
        Ok(())
    }

    /// Mirrors the parameter along a segment whose direction was reversed.
    pub fn flip(&self, seg_length: f64) -> Self {
        match self {
            Self::DetailedWindows { polygons } => Self::DetailedWindows {
                polygons: polygons
                    .iter()
                    .map(|poly| poly.iter().rev().map(|&(u, v)| (seg_length - u, v)).collect())
                    .collect(),
            },
            other => other.clone(),
        }
    }

    /// Scales all dimensions (ratios are unchanged).
    pub fn scale(&self, factor: f64) -> Self {
        match self {
            Self::SingleWindow {
                width,
                height,
                sill_height,
            } => Self::SingleWindow {
                width: width * factor,
                height: height * factor,
                sill_height: sill_height * factor,
            },
            Self::SimpleWindowRatio { ratio } => Self::SimpleWindowRatio { ratio: *ratio },
            Self::RepeatingWindowRatio {
                ratio,
                window_height,
                sill_height,
                horizontal_separation,
                vertical_separation,
            } => Self::RepeatingWindowRatio {
                ratio: *ratio,
                window_height: window_height * factor,
                sill_height: sill_height * factor,
                horizontal_separation: horizontal_separation * factor,
                vertical_separation: vertical_separation * factor,
            },
            Self::DetailedWindows { polygons } => Self::DetailedWindows {
                polygons: polygons
                    .iter()
                    .map(|poly| poly.iter().map(|&(u, v)| (u * factor, v * factor)).collect())
                    .collect(),
            },
        }
    }

    /// Parameter for the part `start..end` of a segment of length `seg_length`.
    ///
    /// Ratio-based parameters carry over unchanged. Geometric windows are kept
    /// only if they lie entirely inside the sub-range.
    pub fn trim(&self, start: f64, end: f64, seg_length: f64, wall_height: f64) -> Option<Self> {
        if self.is_ratio_based() {
            return Some(self.clone());
        }
        let kept: Vec<Vec<Point2>> = self
            .polygons(seg_length, wall_height, 0.)
            .into_iter()
            .filter(|poly| poly.iter().all(|&(u, _)| u >= start - 1e-9 && u <= end + 1e-9))
            .map(|poly| poly.into_iter().map(|(u, v)| (u - start, v)).collect())
            .collect();
        if kept.is_empty() {
            None
        } else {
            Some(Self::DetailedWindows { polygons: kept })
        }
    }

    /// Parameter of the segment obtained by merging two consecutive colinear segments.
    ///
    /// `a` covers the first `len_a` of the merged segment and `b` the remaining `len_b`.
    pub fn merge(
        a: Option<&Self>,
        len_a: f64,
        b: Option<&Self>,
        len_b: f64,
        wall_height: f64,
    ) -> std::result::Result<Option<Self>, String> {
        let total = len_a + len_b;
        let ratio_of = |p: Option<&Self>| match p {
            None => Some(0.),
            Some(Self::SimpleWindowRatio { ratio }) => Some(*ratio),
            _ => None,
        };
        match (a, b) {
            (None, None) => Ok(None),
            (Some(x), Some(y)) if x == y && x.is_ratio_based() => Ok(Some(x.clone())),
            (Some(Self::RepeatingWindowRatio { .. }), _) | (_, Some(Self::RepeatingWindowRatio { .. })) => {
                Err("repeating window ratios can only merge with an identical parameter".to_string())
            }
            _ => {
                if let (Some(ra), Some(rb)) = (ratio_of(a), ratio_of(b)) {
                    let ratio = (ra * len_a + rb * len_b) / total;
                    return Ok(Some(Self::SimpleWindowRatio { ratio }));
                }
                if a.is_some_and(|p| p.is_ratio_based()) || b.is_some_and(|p| p.is_ratio_based()) {
                    return Err("a window ratio cannot merge with explicit window geometry".to_string());
                }
                let mut polygons = a
                    .map(|p| p.polygons(len_a, wall_height, 0.))
                    .unwrap_or_default();
                if let Some(p) = b {
                    polygons.extend(
                        p.polygons(len_b, wall_height, 0.)
                            .into_iter()
                            .map(|poly| poly.into_iter().map(|(u, v)| (u + len_a, v)).collect()),
                    );
                }
                if polygons.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Self::DetailedWindows { polygons }))
                }
            }
        }
    }
}

fn rectangle(u0: f64, v0: f64, w: f64, h: f64) -> Vec<Point2> {
    vec![(u0, v0), (u0 + w, v0), (u0 + w, v0 + h), (u0, v0 + h)]
}

#[allow(clippy::too_many_arguments)]
fn repeating_polygons(
    seg_length: f64,
    wall_height: f64,
    tol: f64,
    ratio: f64,
    window_height: f64,
    sill_height: f64,
    horizontal_separation: f64,
    vertical_separation: f64,
) -> Vec<Vec<Point2>> {
    let target = ratio * seg_length * wall_height;
    if target <= 0. {
        return Vec::new();
    }
    let bays = if horizontal_separation > tol && horizontal_separation < seg_length {
        (seg_length / horizontal_separation).floor().max(1.) as usize
    } else {
        1
    };
    let bay = seg_length / bays as f64;
    let per_bay = target / bays as f64;
    let max_width = bay - 2. * tol;
    let max_height = wall_height - 2. * tol;
    if max_width <= 0. || max_height <= 0. {
        return Vec::new();
    }

    let mut sill = sill_height;
    let mut h = window_height.min(wall_height - sill - tol);
    if h <= tol {
        sill = tol;
        h = window_height.min(max_height);
    }
    let mut w = per_bay / h;
    if w > max_width {
        w = max_width;
        h = (per_bay / w).min(max_height);
        if sill + h > wall_height - tol {
            sill = (wall_height - tol - h).max(tol);
        }
    }

    let split = vertical_separation > 0. && sill + h + vertical_separation <= wall_height - tol;
    let mut polygons = Vec::new();
    for i in 0..bays {
        let u0 = i as f64 * bay + (bay - w) / 2.;
        if split {
            polygons.push(rectangle(u0, sill, w, h / 2.));
            polygons.push(rectangle(u0, sill + h / 2. + vertical_separation, w, h / 2.));
        } else {
            polygons.push(rectangle(u0, sill, w, h));
        }
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    #[test]
    fn test_validation() {
        assert!(WindowParameter::simple_ratio(0.4).is_ok());
        assert!(WindowParameter::simple_ratio(1.2).is_err());
        assert!(WindowParameter::single_window(-1., 1., 1.).is_err());
        assert!(WindowParameter::detailed(vec![vec![(0., 0.), (1., 0.)]]).is_err());
    }

    #[test]
    fn test_simple_ratio_area() {
        let p = WindowParameter::simple_ratio(0.4).unwrap();
        assert!(p.area_from_segment(10., 3.).is_close_tol(12., 1e-9));
    }

    #[test]
    fn test_single_window_is_clipped_to_wall() {
        let p = WindowParameter::single_window(4., 1.5, 1.).unwrap();
        assert!(p.area_from_segment(10., 3.).is_close(6.));
        // Narrow wall clips the width
        assert!(p.area_from_segment(2., 3.).is_close(3.));
        // Sill above the wall leaves nothing
        assert!(p.area_from_segment(10., 0.9).is_close(0.));
    }

    #[test]
    fn test_repeating_ratio_matches_target_area() {
        let p = WindowParameter::repeating_ratio(0.4, 1.6, 0.8, 3., 0.).unwrap();
        let polys = p.polygons(12., 3., 0.01);
        assert_eq!(polys.len(), 4);
        assert!(p.area_from_segment(12., 3.).is_close_tol(0.4 * 36., 1e-9));
    }

    #[test]
    fn test_repeating_ratio_vertical_split() {
        let p = WindowParameter::repeating_ratio(0.3, 1.2, 0.9, 0., 0.2).unwrap();
        let polys = p.polygons(5., 3.5, 0.01);
        assert_eq!(polys.len(), 2);
        assert!(p.area_from_segment(5., 3.5).is_close_tol(0.3 * 5. * 3.5, 1e-9));
    }

    #[test]
    fn test_flip_detailed() {
        let p = WindowParameter::detailed(vec![vec![(1., 1.), (2., 1.), (2., 2.), (1., 2.)]]).unwrap();
        let flipped = p.flip(10.);
        let WindowParameter::DetailedWindows { polygons } = &flipped else {
            panic!("Expected detailed windows");
        };
        assert!(polygons[0].iter().all(|&(u, _)| (8. ..=9.).contains(&u)));
        assert_eq!(flipped.flip(10.), p);
        assert!(flipped.area_from_segment(10., 3.).is_close(1.));
    }

    #[test]
    fn test_merge_ratios() {
        let a = WindowParameter::simple_ratio(0.4).unwrap();
        let merged = WindowParameter::merge(Some(&a), 5., None, 5., 3.).unwrap();
        assert_eq!(merged, Some(WindowParameter::SimpleWindowRatio { ratio: 0.2 }));
        let same = WindowParameter::merge(Some(&a), 5., Some(&a), 3., 3.).unwrap();
        assert_eq!(same, Some(a.clone()));
    }

    #[test]
    fn test_merge_geometric_windows() {
        let single = WindowParameter::single_window(2., 1., 1.).unwrap();
        let merged = WindowParameter::merge(Some(&single), 4., Some(&single), 4., 3.)
            .unwrap()
            .unwrap();
        assert!(matches!(merged, WindowParameter::DetailedWindows { .. }));
        assert!(merged.area_from_segment(8., 3.).is_close(4.));
    }

    #[test]
    fn test_merge_incompatible() {
        let ratio = WindowParameter::simple_ratio(0.4).unwrap();
        let single = WindowParameter::single_window(2., 1., 1.).unwrap();
        assert!(WindowParameter::merge(Some(&ratio), 4., Some(&single), 4., 3.).is_err());
        let rep = WindowParameter::repeating_ratio(0.4, 1.6, 0.8, 3., 0.).unwrap();
        assert!(WindowParameter::merge(Some(&rep), 4., None, 4., 3.).is_err());
    }

    #[test]
    fn test_trim() {
        let single = WindowParameter::single_window(2., 1., 1.).unwrap();
        // Window spans u = 4..6 on a 10 m segment
        let kept = single.trim(3., 10., 10., 3.).unwrap();
        assert!(kept.area_from_segment(7., 3.).is_close(2.));
        assert!(single.trim(0., 5., 10., 3.).is_none());
        let ratio = WindowParameter::simple_ratio(0.3).unwrap();
        assert_eq!(ratio.trim(0., 5., 10., 3.), Some(ratio.clone()));
    }

    #[test]
    fn test_serde_tagging() {
        let p = WindowParameter::simple_ratio(0.4).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"type":"SimpleWindowRatio","ratio":0.4}"#);
    }
}
