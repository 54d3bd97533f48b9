//! Curve type selection
//!
//! Maps an authored curve-type tag plus control points onto the right
//! approximator chain and resamples the result.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bezier::bezier_segments;
use super::catmull::catmull_segments;
use super::circle::CircularArc;
use super::resample::ResampledCurve;
use crate::consts::*;

/// Authored interpolation family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    #[default]
    Bezier,
    Linear,
    Catmull,
    Passthrough,
}

impl CurveType {
    /// Parse the single-letter tag used in beatmap files (`B`, `L`, `C`, `P`).
    /// Unknown tags are treated as Bezier.
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_uppercase() {
            'L' => CurveType::Linear,
            'C' => CurveType::Catmull,
            'P' => CurveType::Passthrough,
            _ => CurveType::Bezier,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            CurveType::Bezier => 'B',
            CurveType::Linear => 'L',
            CurveType::Catmull => 'C',
            CurveType::Passthrough => 'P',
        }
    }
}

/// Resampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParams {
    /// Distance between resampled points (clamped to 1..=100)
    pub point_separation: f32,
    pub max_points: usize,
    /// Arc coordinates are clamped to +-this
    pub sanity_range: f32,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            point_separation: CURVE_POINT_SEPARATION,
            max_points: CURVE_MAX_POINTS,
            sanity_range: CURVE_MAX_LENGTH,
        }
    }
}

/// True when the perpendicular bisectors of a 3-point path are parallel
fn is_colinear(points: &[Vec2]) -> bool {
    let nor_a = (points[1] - points[0]).perp();
    let nor_b = (points[1] - points[2]).perp();
    (nor_b.x * nor_a.y - nor_b.y * nor_a.x).abs() < 0.00001
}

/// Build the resampled curve for one slider path
pub fn build_curve(
    curve_type: CurveType,
    control_points: &[Vec2],
    target_length: f32,
    params: &CurveParams,
) -> ResampledCurve {
    let sep = params.point_separation;
    let max = params.max_points;

    let segments = match curve_type {
        CurveType::Passthrough if control_points.len() == 3 => {
            if is_colinear(control_points) {
                bezier_segments(control_points, false)
            } else {
                let fitted = CircularArc::new(
                    control_points[0],
                    control_points[1],
                    control_points[2],
                    target_length,
                    params.sanity_range,
                );
                match fitted {
                    Some(arc) => return ResampledCurve::from_arc(arc, target_length, sep, max),
                    None => bezier_segments(control_points, false),
                }
            }
        }
        CurveType::Catmull => catmull_segments(control_points),
        CurveType::Linear => bezier_segments(control_points, true),
        CurveType::Bezier | CurveType::Passthrough => bezier_segments(control_points, false),
    };

    if segments.is_empty() {
        log::warn!(
            "{:?} curve with {} control points has no geometry",
            curve_type,
            control_points.len()
        );
    }

    ResampledCurve::from_segments(&segments, target_length, sep, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn build(kind: CurveType, pts: &[Vec2], len: f32) -> ResampledCurve {
        build_curve(kind, pts, len, &CurveParams::default())
    }

    #[test]
    fn test_from_char() {
        assert_eq!(CurveType::from_char('L'), CurveType::Linear);
        assert_eq!(CurveType::from_char('p'), CurveType::Passthrough);
        assert_eq!(CurveType::from_char('C'), CurveType::Catmull);
        assert_eq!(CurveType::from_char('x'), CurveType::Bezier);
        assert_eq!(CurveType::Passthrough.as_char(), 'P');
    }

    #[test]
    fn test_linear_midpoint() {
        let pts = [Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0)];
        let curve = build(CurveType::Linear, &pts, 200.0);
        assert_eq!(curve.point_at(0.0), pts[0]);
        assert_eq!(curve.point_at(0.5), Vec2::new(200.0, 100.0));
        assert_eq!(curve.point_at(1.0), pts[1]);
    }

    #[test]
    fn test_colinear_passthrough_matches_bezier() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 100.0),
        ];
        let len = 100.0;
        let pass = build(CurveType::Passthrough, &pts, len);
        let bez = build(CurveType::Bezier, &pts, len);
        assert_eq!(pass.points(), bez.points());
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert_eq!(pass.point_at(t), bez.point_at(t));
        }
    }

    #[test]
    fn test_passthrough_uses_arc() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(100.0, 0.0),
        ];
        let curve = build(CurveType::Passthrough, &pts, 50.0 * std::f32::consts::PI);
        assert!(curve.point_at(0.5).distance(pts[1]) < 1e-2);
        assert!(curve.point_at(1.0).distance(pts[2]) < 1e-2);
        assert_eq!(curve.segments().len(), 1);
    }

    #[test]
    fn test_passthrough_with_four_points_is_bezier() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(150.0, 50.0),
        ];
        let pass = build(CurveType::Passthrough, &pts, 150.0);
        let bez = build(CurveType::Bezier, &pts, 150.0);
        assert_eq!(pass.points(), bez.points());
    }

    #[test]
    fn test_catmull_curve_starts_on_first_point() {
        let pts = [
            Vec2::new(10.0, 10.0),
            Vec2::new(60.0, 30.0),
            Vec2::new(110.0, 10.0),
        ];
        let curve = build(CurveType::Catmull, &pts, 80.0);
        assert!(curve.point_at(0.0).distance(pts[0]) < 1e-3);
        assert!(!curve.is_empty());
    }

    #[test]
    fn test_degenerate_inputs_do_not_panic() {
        assert_eq!(build(CurveType::Bezier, &[], 100.0).point_at(0.5), Vec2::ZERO);
        assert_eq!(build(CurveType::Catmull, &[Vec2::ONE], 100.0).point_at(1.0), Vec2::ZERO);
        let same = [Vec2::ONE; 3];
        let curve = build(CurveType::Passthrough, &same, 100.0);
        assert!(curve.point_at(1.0).is_finite());
    }

    proptest! {
        #[test]
        fn prop_sampled_length_matches_target(
            x in 50.0f32..400.0,
            y in -200.0f32..200.0,
            frac in 0.1f32..1.0,
        ) {
            let end = Vec2::new(x, y);
            let target = end.length() * frac;
            let curve = build(CurveType::Linear, &[Vec2::ZERO, end], target);
            prop_assert!((curve.sampled_length() - target).abs() <= CURVE_POINT_SEPARATION);
            prop_assert_eq!(curve.point_at(0.0), Vec2::ZERO);
        }

        #[test]
        fn prop_point_at_is_finite(t in 0.0f32..=1.0) {
            let pts = [
                Vec2::new(0.0, 0.0),
                Vec2::new(80.0, 120.0),
                Vec2::new(160.0, 0.0),
                Vec2::new(160.0, 0.0),
                Vec2::new(240.0, 60.0),
            ];
            let curve = build(CurveType::Bezier, &pts, 300.0);
            prop_assert!(curve.point_at(t).is_finite());
        }
    }
}
