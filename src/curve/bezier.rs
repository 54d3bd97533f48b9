//! Adaptive Bezier approximation
//!
//! Subdivides the control polygon with de Casteljau halving until every
//! piece is flat enough, then emits a smoothed point per interior control
//! point. Uses an explicit work stack so pathological inputs cannot blow the
//! call stack.

use glam::Vec2;

use super::primitives::ApproximatedSegment;
use crate::consts::BEZIER_TOLERANCE;

const TOLERANCE_SQ: f32 = BEZIER_TOLERANCE * BEZIER_TOLERANCE;

/// Scratch buffers reused across subdivisions of one curve
struct Subdivider {
    count: usize,
    midpoints: Vec<Vec2>,
    left: Vec<Vec2>,
    right: Vec<Vec2>,
}

impl Subdivider {
    fn new(count: usize) -> Self {
        Self {
            count,
            midpoints: vec![Vec2::ZERO; count],
            left: vec![Vec2::ZERO; count * 2 - 1],
            right: vec![Vec2::ZERO; count],
        }
    }

    /// Split `points` at t = 0.5 into `l` (first `count` entries) and `r`
    fn subdivide(&mut self, points: &[Vec2], l: &mut [Vec2], r: &mut [Vec2]) {
        let n = self.count;
        self.midpoints.copy_from_slice(points);

        for i in 0..n {
            l[i] = self.midpoints[0];
            r[n - i - 1] = self.midpoints[n - i - 1];

            for j in 0..n - i - 1 {
                self.midpoints[j] = (self.midpoints[j] + self.midpoints[j + 1]) / 2.0;
            }
        }
    }

    /// Emit the approximation of a flat piece (without its last point)
    fn approximate(&mut self, points: &[Vec2], output: &mut Vec<Vec2>) {
        let n = self.count;
        let mut l = std::mem::take(&mut self.left);
        let mut r = std::mem::take(&mut self.right);

        self.subdivide(points, &mut l, &mut r);
        for i in 0..n - 1 {
            l[n + i] = r[i + 1];
        }

        output.push(points[0]);
        for i in 1..n - 1 {
            let index = 2 * i;
            output.push(0.25 * (l[index - 1] + 2.0 * l[index] + l[index + 1]));
        }

        self.left = l;
        self.right = r;
    }
}

fn is_flat_enough(points: &[Vec2]) -> bool {
    points
        .windows(3)
        .all(|w| (w[0] - 2.0 * w[1] + w[2]).length_squared() <= TOLERANCE_SQ * 4.0)
}

/// Approximate a single Bezier curve of any degree as a polyline.
///
/// The result starts and ends exactly on the first and last control points.
/// No control points gives an empty polyline.
pub fn approximate_bezier(control_points: &[Vec2]) -> Vec<Vec2> {
    let count = control_points.len();
    let mut output = Vec::new();
    if count == 0 {
        return output;
    }

    let mut subdivider = Subdivider::new(count);
    let mut left_child = vec![Vec2::ZERO; count * 2 - 1];
    let mut to_flatten: Vec<Vec<Vec2>> = vec![control_points.to_vec()];
    let mut free_buffers: Vec<Vec<Vec2>> = Vec::new();

    while let Some(mut parent) = to_flatten.pop() {
        if is_flat_enough(&parent) {
            subdivider.approximate(&parent, &mut output);
            free_buffers.push(parent);
            continue;
        }

        let mut right_child = free_buffers
            .pop()
            .unwrap_or_else(|| vec![Vec2::ZERO; count]);
        subdivider.subdivide(&parent, &mut left_child, &mut right_child);
        parent.copy_from_slice(&left_child[..count]);

        // left half is popped first
        to_flatten.push(right_child);
        to_flatten.push(parent);
    }

    output.push(control_points[count - 1]);
    output
}

/// Split an authored point list into Bezier segments.
///
/// In `line` mode every consecutive pair becomes its own straight segment.
/// Otherwise a repeated point ("red anchor") ends one curve and starts the
/// next; groups with fewer than 2 points are dropped.
pub fn bezier_segments(control_points: &[Vec2], line: bool) -> Vec<ApproximatedSegment> {
    let mut segments = Vec::new();
    let mut points: Vec<Vec2> = Vec::new();
    let mut last_point: Option<Vec2> = None;

    for (i, &current) in control_points.iter().enumerate() {
        if line {
            if i > 0 {
                points.push(current);
                segments.push(ApproximatedSegment::from_points(approximate_bezier(&points)));
                points.clear();
            }
        } else if i > 0 && last_point == Some(current) {
            if points.len() >= 2 {
                segments.push(ApproximatedSegment::from_points(approximate_bezier(&points)));
            }
            points.clear();
        }

        points.push(current);
        last_point = Some(current);
    }

    // a trailing red anchor leaves a single point behind, ignore it
    if !line && points.len() >= 2 {
        segments.push(ApproximatedSegment::from_points(approximate_bezier(&points)));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_point_bezier_is_line() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        assert_eq!(approximate_bezier(&pts), vec![pts[0], pts[1]]);
    }

    #[test]
    fn test_empty_bezier() {
        assert!(approximate_bezier(&[]).is_empty());
        assert_eq!(approximate_bezier(&[Vec2::ONE]), vec![Vec2::ONE, Vec2::ONE]);
    }

    #[test]
    fn test_quadratic_endpoints_and_flatness() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 100.0),
            Vec2::new(100.0, 0.0),
        ];
        let out = approximate_bezier(&pts);
        assert!(out.len() > 10);
        assert_eq!(out[0], pts[0]);
        assert_eq!(*out.last().unwrap(), pts[2]);

        // apex of the quadratic is at (50, 50)
        let max_y = out.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_y - 50.0).abs() < 0.5, "max_y = {max_y}");

        // x grows monotonically along a symmetric arch
        assert!(out.windows(2).all(|w| w[1].x >= w[0].x));
    }

    #[test]
    fn test_red_anchor_splits() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 50.0),
        ];
        let segs = bezier_segments(&pts, false);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].points(), &[Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0)]);
        assert_eq!(segs[1].points()[0], Vec2::new(50.0, 0.0));
        assert_eq!(*segs[1].points().last().unwrap(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_trailing_red_anchor_ignored() {
        let pts = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0)];
        let segs = bezier_segments(&pts, false);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].total_distance(), 10.0);
    }

    #[test]
    fn test_line_mode_pairs() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
        ];
        let segs = bezier_segments(&pts, true);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].total_distance(), 10.0);
        assert_eq!(segs[1].points(), &[Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]);
    }
}
