//! Centripetal Catmull-Rom segments
//!
//! Knots are unit spaced (t = 0, 1, 2, 3), so each window of four control
//! points yields the curve between its two middle points.

use glam::Vec2;

use super::primitives::ApproximatedSegment;

const KNOTS: [f32; 4] = [0.0, 1.0, 2.0, 3.0];

/// Barry-Goldman evaluation of one 4-point window at t in [0, 1]
fn point_at(p: &[Vec2; 4], t: f32) -> Vec2 {
    let [t0, t1, t2, t3] = KNOTS;
    let t = t * (t2 - t1) + t1;

    let a1 = p[0] * ((t1 - t) / (t1 - t0)) + p[1] * ((t - t0) / (t1 - t0));
    let a2 = p[1] * ((t2 - t) / (t2 - t1)) + p[2] * ((t - t1) / (t2 - t1));
    let a3 = p[2] * ((t3 - t) / (t3 - t2)) + p[3] * ((t - t2) / (t3 - t2));

    let b1 = a1 * ((t2 - t) / (t2 - t0)) + a2 * ((t - t0) / (t2 - t0));
    let b2 = a2 * ((t3 - t) / (t3 - t1)) + a3 * ((t - t1) / (t3 - t1));

    b1 * ((t2 - t) / (t2 - t1)) + b2 * ((t - t1) / (t2 - t1))
}

/// Approximate one Catmull-Rom window. Anything but exactly 4 points is
/// logged and yields an empty segment.
pub fn catmull_segment(points: &[Vec2]) -> ApproximatedSegment {
    let Ok(window) = <[Vec2; 4]>::try_from(points) else {
        log::error!(
            "Catmull-Rom segment needs exactly 4 points, got {}",
            points.len()
        );
        return ApproximatedSegment::default();
    };

    let approx_length: f32 = window
        .windows(2)
        .map(|w| {
            let len = w[0].distance(w[1]);
            if len <= 0.0 { len + 0.0001 } else { len }
        })
        .sum();

    ApproximatedSegment::sample(approx_length / 2.0, |t| point_at(&window, t))
}

/// Build the chain of Catmull-Rom segments for an authored point list.
///
/// The first and last points are doubled (when not already doubled) so the
/// spline passes through both ends.
pub fn catmull_segments(control_points: &[Vec2]) -> Vec<ApproximatedSegment> {
    let n = control_points.len();
    if n < 2 {
        log::warn!("Catmull-Rom curve with {n} control points, skipping");
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut window: Vec<Vec2> = Vec::with_capacity(4);

    if control_points[0] != control_points[1] {
        window.push(control_points[0]);
    }

    for &p in control_points {
        window.push(p);
        if window.len() >= 4 {
            segments.push(catmull_segment(&window));
            window.remove(0);
        }
    }

    if control_points[n - 1] != control_points[n - 2] {
        window.push(control_points[n - 1]);
    }
    if window.len() >= 4 {
        segments.push(catmull_segment(&window));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_passes_through_middle_points() {
        let p = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(30.0, 10.0),
        ];
        let seg = catmull_segment(&p);
        assert!(seg.points()[0].distance(p[1]) < 1e-4);
        assert!(seg.points().last().unwrap().distance(p[2]) < 1e-4);
    }

    #[test]
    fn test_wrong_window_size_is_empty() {
        let seg = catmull_segment(&[Vec2::ZERO, Vec2::ONE, Vec2::X]);
        assert!(seg.is_empty());
    }

    #[test]
    fn test_endpoint_doubling() {
        // a b c -> (a a b c) (a b c c)
        let pts = [Vec2::ZERO, Vec2::new(50.0, 0.0), Vec2::new(100.0, 50.0)];
        let segs = catmull_segments(&pts);
        assert_eq!(segs.len(), 2);
        assert!(segs[0].points()[0].distance(pts[0]) < 1e-4);
        assert!(segs[1].points().last().unwrap().distance(pts[2]) < 1e-4);
    }

    #[test]
    fn test_already_doubled_endpoints() {
        // a a b b -> one window
        let pts = [
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::new(40.0, 0.0),
            Vec2::new(40.0, 0.0),
        ];
        let segs = catmull_segments(&pts);
        assert_eq!(segs.len(), 1);
        assert!((segs[0].total_distance() - 40.0).abs() < 0.1);
    }

    #[test]
    fn test_too_few_points() {
        assert!(catmull_segments(&[Vec2::ONE]).is_empty());
    }
}
