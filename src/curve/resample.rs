//! Equal-distance resampling
//!
//! Walks a chain of approximated segments and re-emits points at a fixed
//! arc-length spacing so the curve can be queried by percentage of its
//! authored length.

use glam::Vec2;

use super::circle::CircularArc;
use super::primitives::{ApproximatedSegment, polyline_length};

/// A slider path resampled to its authored length.
///
/// `point_at(t)` maps t in [0, 1] onto the authored length. A stack offset can
/// be applied and removed at any time; the un-offset copy stays queryable
/// through `original_point_at`.
#[derive(Debug, Clone, Default)]
pub struct ResampledCurve {
    target_length: f32,
    /// Number of resampling steps (points = n_curve + 1)
    n_curve: usize,
    points: Vec<Vec2>,
    /// Runs of raw points that can be traced without a seam
    segments: Vec<Vec<Vec2>>,
    original_points: Vec<Vec2>,
    original_segments: Vec<Vec<Vec2>>,
    /// Tangent angles in degrees, used for reverse arrows
    start_angle: f32,
    end_angle: f32,
    /// Circular arcs are evaluated analytically instead of through `points`
    arc: Option<CircularArc>,
}

impl ResampledCurve {
    /// Curve with no geometry: every query returns the origin
    pub fn empty(target_length: f32) -> Self {
        Self {
            target_length,
            ..Default::default()
        }
    }

    /// Resample a chain of segments to `target_length`
    pub fn from_segments(
        segments: &[ApproximatedSegment],
        target_length: f32,
        point_separation: f32,
        max_points: usize,
    ) -> Self {
        let steps = (target_length / point_separation.clamp(1.0, 100.0)) as i64;
        let n_curve = steps.clamp(0, max_points as i64) as usize;
        let mut curve = Self {
            target_length,
            n_curve,
            ..Default::default()
        };

        let Some(first) = segments.first() else {
            log::warn!("resampling a curve without segments");
            return curve;
        };
        if first.is_empty() {
            log::error!("resampling a curve whose first segment has no points");
            return curve;
        }

        curve.walk(segments);
        curve.trim_segments();
        curve.compute_tangent_angles();

        curve.original_points = curve.points.clone();
        curve.original_segments = curve.segments.clone();
        curve
    }

    /// Wrap a fitted arc. Points are sampled for drawing; queries stay analytic.
    pub fn from_arc(
        arc: CircularArc,
        target_length: f32,
        point_separation: f32,
        max_points: usize,
    ) -> Self {
        let points = arc.sample(target_length, point_separation, max_points);
        let (start_angle, end_angle) = arc.tangent_angles();

        Self {
            target_length,
            n_curve: points.len().saturating_sub(1),
            segments: vec![points.clone()],
            original_segments: vec![points.clone()],
            original_points: points.clone(),
            points,
            start_angle,
            end_angle,
            arc: Some(arc),
        }
    }

    /// Emit n_curve + 1 points spaced by target_length / n_curve
    fn walk(&mut self, segments: &[ApproximatedSegment]) {
        let n_curve = self.n_curve;
        let mut cur_index = 0;
        let mut cur = &segments[0];
        let mut cur_point = 0usize;

        let mut distance_at = 0.0f32;
        let mut last_distance_at = 0.0f32;
        let mut last_curve = cur.points()[0];

        let mut next_segment_start = Vec2::ZERO;
        let mut current_run: Vec<Vec2> = Vec::new();
        self.points.reserve(n_curve + 1);

        for i in 0..=n_curve {
            let raw = (i as f32 * self.target_length) / n_curve as f32;
            let pref_distance = if raw.is_finite() && raw.abs() <= i32::MAX as f32 {
                raw as i32 as f32
            } else {
                0.0
            };

            while distance_at < pref_distance {
                last_distance_at = distance_at;
                if let Some(&p) = cur.points().get(cur_point) {
                    last_curve = p;
                }

                cur_point += 1;
                if cur_point >= cur.len() {
                    if let Some(next) = segments.get(cur_index + 1) {
                        // close the current run; the next one starts exactly where it ended
                        if !current_run.is_empty() {
                            self.segments.push(std::mem::take(&mut current_run));
                            if !self.points.is_empty() {
                                current_run.push(next_segment_start);
                            }
                        }

                        cur_index += 1;
                        cur = next;
                        cur_point = 0;
                    } else {
                        cur_point = cur.len().saturating_sub(1);
                        if last_distance_at == distance_at {
                            // out of geometry before reaching the target length
                            break;
                        }
                    }
                }

                if let Some(&d) = cur.distances().get(cur_point) {
                    distance_at += d;
                }
            }

            let this_curve = cur.points().get(cur_point).copied().unwrap_or(Vec2::ZERO);

            let span = distance_at - last_distance_at;
            let point = if span > 1.0 {
                last_curve.lerp(this_curve, (pref_distance - last_distance_at) / span)
            } else {
                this_curve
            };
            self.points.push(point);

            // runs keep the raw point, not the interpolated one
            next_segment_start = this_curve;
            current_run.push(this_curve);
        }

        if !current_run.is_empty() {
            self.segments.push(current_run);
        }
    }

    /// Shorten the raw runs from the tail until they are no longer than the
    /// target length. A run never loses its first point.
    fn trim_segments(&mut self) {
        let segmented_length: f32 = self.segments.iter().map(|s| polyline_length(s)).sum();
        let can_trim = self.segments.len() > 1 && self.segments[0].len() > 1;
        if segmented_length <= self.target_length || !can_trim {
            return;
        }

        let mut excess = segmented_length - self.target_length;
        'trim: for run in self.segments.iter_mut().rev() {
            while run.len() > 1 {
                let p = run.len() - 1;
                let len = run[p].distance(run[p - 1]);
                if len >= excess {
                    let dir = (run[p] - run[p - 1]).normalize_or_zero();
                    run[p] -= dir * excess;
                    break 'trim;
                }
                run.pop();
                excess -= len;
            }
        }
    }

    fn compute_tangent_angles(&mut self) {
        let pts = &self.points;
        if pts.len() < 2 {
            return;
        }

        let c1 = pts[0];
        let mut cnt = 1;
        let mut c2 = pts[cnt];
        cnt += 1;
        while cnt <= self.n_curve && cnt < pts.len() && c2.distance(c1) < 1.0 {
            c2 = pts[cnt];
            cnt += 1;
        }
        self.start_angle = crate::angle_degrees(c1, c2);

        if let Some(&c1) = pts.get(self.n_curve) {
            let mut cnt = self.n_curve as isize - 1;
            let mut c2 = pts[cnt.max(0) as usize];
            cnt -= 1;
            while cnt >= 0 && c2.distance(c1) < 1.0 {
                c2 = pts[cnt as usize];
                cnt -= 1;
            }
            self.end_angle = crate::angle_degrees(c1, c2);
        }
    }

    fn lookup(points: &[Vec2], n_curve: usize, t: f32) -> Vec2 {
        if points.is_empty() {
            return Vec2::ZERO;
        }

        let index_f = t * n_curve as f32;
        let index = index_f as i64;
        if index >= n_curve as i64 {
            return match points.get(n_curve) {
                Some(&p) => p,
                None => {
                    log::error!("curve lookup: illegal end index {n_curve}");
                    Vec2::ZERO
                }
            };
        }

        if index < 0 || index as usize + 1 >= points.len() {
            log::error!("curve lookup: illegal index {index}");
            return Vec2::ZERO;
        }

        let i = index as usize;
        points[i].lerp(points[i + 1], index_f - index as f32)
    }

    /// Position at fraction t of the target length
    pub fn point_at(&self, t: f32) -> Vec2 {
        match &self.arc {
            Some(arc) => arc.point_at(t),
            None => Self::lookup(&self.points, self.n_curve, t),
        }
    }

    /// Position at fraction t, ignoring the stack offset
    pub fn original_point_at(&self, t: f32) -> Vec2 {
        match &self.arc {
            Some(arc) => arc.original_point_at(t),
            None => Self::lookup(&self.original_points, self.n_curve, t),
        }
    }

    /// Shift every point by `-(offset, offset)`, with y mirrored under Hard Rock
    pub fn update_stack_position(&mut self, offset: f32, hard_rock: bool) {
        let shift = Vec2::new(offset, if hard_rock { -offset } else { offset });

        for (p, o) in self.points.iter_mut().zip(&self.original_points) {
            *p = *o - shift;
        }
        for (run, original) in self.segments.iter_mut().zip(&self.original_segments) {
            for (p, o) in run.iter_mut().zip(original) {
                *p = *o - shift;
            }
        }
        if let Some(arc) = &mut self.arc {
            arc.set_offset(shift);
        }
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn segments(&self) -> &[Vec<Vec2>] {
        &self.segments
    }

    #[inline]
    pub fn n_curve(&self) -> usize {
        self.n_curve
    }

    #[inline]
    pub fn target_length(&self) -> f32 {
        self.target_length
    }

    #[inline]
    pub fn start_angle(&self) -> f32 {
        self.start_angle
    }

    #[inline]
    pub fn end_angle(&self) -> f32 {
        self.end_angle
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Summed length of the resampled points
    pub fn sampled_length(&self) -> f32 {
        polyline_length(&self.points)
    }

    /// Summed length of the raw continuity runs
    pub fn segmented_length(&self) -> f32 {
        self.segments.iter().map(|s| polyline_length(s)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::bezier::bezier_segments;

    fn line(len: f32) -> Vec<ApproximatedSegment> {
        bezier_segments(&[Vec2::ZERO, Vec2::new(len, 0.0)], true)
    }

    #[test]
    fn test_point_count_and_endpoints() {
        let curve = ResampledCurve::from_segments(&line(100.0), 100.0, 2.5, 9999);
        assert_eq!(curve.n_curve(), 40);
        assert_eq!(curve.points().len(), 41);
        assert_eq!(curve.point_at(0.0), Vec2::ZERO);
        assert_eq!(curve.point_at(1.0), Vec2::new(100.0, 0.0));
        assert_eq!(curve.point_at(0.5), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_shorter_target_stops_early() {
        let curve = ResampledCurve::from_segments(&line(100.0), 60.0, 2.5, 9999);
        assert_eq!(curve.point_at(1.0), Vec2::new(60.0, 0.0));
        assert!((curve.sampled_length() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_longer_target_clamps_to_geometry() {
        let curve = ResampledCurve::from_segments(&line(50.0), 100.0, 2.5, 9999);
        assert_eq!(curve.points().len(), 41);
        assert_eq!(curve.point_at(1.0), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_max_points_cap() {
        let curve = ResampledCurve::from_segments(&line(1000.0), 1000.0, 1.0, 100);
        assert_eq!(curve.n_curve(), 100);
        assert_eq!(curve.point_at(1.0), Vec2::new(1000.0, 0.0));
    }

    #[test]
    fn test_zero_length_is_single_point() {
        let curve = ResampledCurve::from_segments(&line(100.0), 0.0, 2.5, 9999);
        assert_eq!(curve.points(), &[Vec2::ZERO]);
        assert_eq!(curve.point_at(0.0), Vec2::ZERO);
        assert_eq!(curve.point_at(1.0), Vec2::ZERO);
    }

    #[test]
    fn test_empty_input_falls_back_to_origin() {
        let curve = ResampledCurve::from_segments(&[], 100.0, 2.5, 9999);
        assert!(curve.is_empty());
        assert_eq!(curve.point_at(0.3), Vec2::ZERO);
        assert_eq!(curve.original_point_at(1.0), Vec2::ZERO);
    }

    #[test]
    fn test_corner_creates_continuity_break() {
        let pts = [Vec2::ZERO, Vec2::new(50.0, 0.0), Vec2::new(50.0, 50.0)];
        let curve = ResampledCurve::from_segments(&bezier_segments(&pts, true), 100.0, 2.5, 9999);
        assert_eq!(curve.segments().len(), 2);

        // the second run starts exactly on the corner
        assert_eq!(curve.segments()[1][0], Vec2::new(50.0, 0.0));
        assert_eq!(curve.point_at(1.0), Vec2::new(50.0, 50.0));
        assert!(curve.segmented_length() <= 100.0 + 1e-3);
    }

    #[test]
    fn test_tangent_angles() {
        let pts = [Vec2::ZERO, Vec2::new(0.0, 50.0)];
        let curve = ResampledCurve::from_segments(&bezier_segments(&pts, true), 50.0, 2.5, 9999);
        assert!((curve.start_angle() - 90.0).abs() < 1e-3);
        assert!((curve.end_angle() - -90.0).abs() < 1e-3);
    }

    #[test]
    fn test_stack_offset_round_trip() {
        let mut curve = ResampledCurve::from_segments(&line(100.0), 100.0, 2.5, 9999);
        curve.update_stack_position(4.0, false);
        assert_eq!(curve.point_at(0.0), Vec2::new(-4.0, -4.0));
        assert_eq!(curve.original_point_at(0.0), Vec2::ZERO);

        curve.update_stack_position(4.0, true);
        assert_eq!(curve.point_at(0.0), Vec2::new(-4.0, 4.0));

        curve.update_stack_position(0.0, false);
        assert_eq!(curve.point_at(1.0), Vec2::new(100.0, 0.0));
    }
}
