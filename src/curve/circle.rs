//! Circular arc through three points ("perfect circle" sliders)

use std::f32::consts::PI;

use glam::Vec2;

/// Arc on the circle circumscribing three authored points, extended or cut
/// so its length matches the target length.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularArc {
    center: Vec2,
    original_center: Vec2,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    sanity_range: f32,
}

/// true if b lies strictly between a and c (in either direction)
#[inline]
fn is_in(a: f32, b: f32, c: f32) -> bool {
    (b > a && b < c) || (b < a && b > c)
}

/// Intersection of the lines a + s*ta and b + u*tb
fn intersect(a: Vec2, ta: Vec2, b: Vec2, tb: Vec2) -> Vec2 {
    let des = tb.x * ta.y - tb.y * ta.x;
    if des.abs() < 0.0001 {
        log::warn!("circular arc: bisectors are parallel");
        return Vec2::ZERO;
    }

    let u = ((b.y - a.y) * ta.x + (a.x - b.x) * ta.y) / des;
    b + tb * u
}

impl CircularArc {
    /// Fit the arc. Returns `None` (after logging) when no angle range
    /// passes through the middle point.
    pub fn new(start: Vec2, mid: Vec2, end: Vec2, length: f32, sanity_range: f32) -> Option<Self> {
        let mid_a = start + (mid - start) * 0.5;
        let mid_b = end + (mid - end) * 0.5;
        let nor_a = (mid - start).perp();
        let nor_b = (mid - end).perp();

        let center = intersect(mid_a, nor_a, mid_b, nor_b);

        let start_rel = start - center;
        let mid_rel = mid - center;
        let end_rel = end - center;

        let mut start_angle = start_rel.y.atan2(start_rel.x);
        let mid_angle = mid_rel.y.atan2(mid_rel.x);
        let mut end_angle = end_rel.y.atan2(end_rel.x);

        // pick the angle range that passes through the middle point
        if !is_in(start_angle, mid_angle, end_angle) {
            let tau = 2.0 * PI;
            if (start_angle + tau - end_angle).abs() < tau
                && is_in(start_angle + tau, mid_angle, end_angle)
            {
                start_angle += tau;
            } else if (start_angle - (end_angle + tau)).abs() < tau
                && is_in(start_angle, mid_angle, end_angle + tau)
            {
                end_angle += tau;
            } else if (start_angle - tau - end_angle).abs() < tau
                && is_in(start_angle - tau, mid_angle, end_angle)
            {
                start_angle -= tau;
            } else if (start_angle - (end_angle - tau)).abs() < tau
                && is_in(start_angle, mid_angle, end_angle - tau)
            {
                end_angle -= tau;
            } else {
                log::error!(
                    "circular arc: no angle range through mid ({start_angle:.3} {mid_angle:.3} {end_angle:.3})"
                );
                return None;
            }
        }

        let radius = start_rel.length();
        let arc_angle = length / radius;
        end_angle = if end_angle > start_angle {
            start_angle + arc_angle
        } else {
            start_angle - arc_angle
        };

        Some(Self {
            center,
            original_center: center,
            radius,
            start_angle,
            end_angle,
            sanity_range,
        })
    }

    fn point_around(&self, center: Vec2, t: f32) -> Vec2 {
        let angle = self.start_angle + (self.end_angle - self.start_angle) * t;
        let range = self.sanity_range;
        Vec2::new(
            (angle.cos() * self.radius + center.x).clamp(-range, range),
            (angle.sin() * self.radius + center.y).clamp(-range, range),
        )
    }

    /// Point at fraction t of the arc, around the (possibly stacked) center
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.point_around(self.center, t)
    }

    /// Same as [`point_at`](Self::point_at), ignoring any stack offset
    pub fn original_point_at(&self, t: f32) -> Vec2 {
        self.point_around(self.original_center, t)
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.center = self.original_center - offset;
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Tangent angles (degrees) at the start and end, for reverse arrows
    pub fn tangent_angles(&self) -> (f32, f32) {
        let clockwise = self.start_angle > self.end_angle;
        let start = self.start_angle + if clockwise { -PI / 2.0 } else { PI / 2.0 };
        let end = self.end_angle + if clockwise { PI / 2.0 } else { -PI / 2.0 };
        (start.to_degrees(), end.to_degrees())
    }

    /// Sample the arc every `separation` units, at most `max_points` steps
    pub fn sample(&self, length: f32, separation: f32, max_points: usize) -> Vec<Vec2> {
        let steps = (length / separation.clamp(1.0, 100.0)).min(max_points as f32);
        if !(steps > 0.0) {
            return vec![self.point_at(0.0)];
        }
        let int_steps = steps.round().max(0.0) as usize + 2;

        let mut points = Vec::with_capacity(int_steps);
        for i in 0..int_steps {
            let t = (i as f32 / steps).clamp(0.0, 1.0);
            points.push(self.point_at(t));
            if t >= 1.0 {
                break;
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CURVE_MAX_LENGTH;
    use crate::curve::polyline_length;

    fn half_circle() -> CircularArc {
        // radius 50 around (50, 0), going over the top
        CircularArc::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(100.0, 0.0),
            50.0 * PI,
            CURVE_MAX_LENGTH,
        )
        .unwrap()
    }

    #[test]
    fn test_center_and_radius() {
        let arc = half_circle();
        assert!(arc.center().distance(Vec2::new(50.0, 0.0)) < 1e-3);
        assert!((arc.radius() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_arc_passes_through_authored_points() {
        let arc = half_circle();
        assert!(arc.point_at(0.0).distance(Vec2::ZERO) < 1e-3);
        assert!(arc.point_at(0.5).distance(Vec2::new(50.0, -50.0)) < 1e-2);
        assert!(arc.point_at(1.0).distance(Vec2::new(100.0, 0.0)) < 1e-2);
    }

    #[test]
    fn test_length_follows_target() {
        // a quarter of the length stops a quarter of the way around
        let arc = CircularArc::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(100.0, 0.0),
            25.0 * PI,
            CURVE_MAX_LENGTH,
        )
        .unwrap();
        assert!(arc.point_at(1.0).distance(Vec2::new(50.0, -50.0)) < 1e-2);

        let pts = arc.sample(25.0 * PI, 2.5, 9999);
        assert!((polyline_length(&pts) - 25.0 * PI).abs() < 0.1);
    }

    #[test]
    fn test_sample_ends_at_t_one() {
        let arc = half_circle();
        let pts = arc.sample(50.0 * PI, 2.5, 9999);
        assert!(pts.last().unwrap().distance(Vec2::new(100.0, 0.0)) < 1e-2);
        assert!(pts.len() <= (50.0 * PI / 2.5).round() as usize + 2);
    }

    #[test]
    fn test_zero_length_samples_start_only() {
        let arc = half_circle();
        for length in [0.0, -3.0, f32::NAN] {
            let pts = arc.sample(length, 2.5, 9999);
            assert_eq!(pts.len(), 1);
            assert!(pts[0].is_finite());
            assert!(pts[0].distance(Vec2::ZERO) < 1e-3);
        }
        assert_eq!(arc.sample(10.0, 2.5, 0).len(), 1);
    }

    #[test]
    fn test_offset_moves_center_only() {
        let mut arc = half_circle();
        arc.set_offset(Vec2::new(5.0, 5.0));
        assert!(arc.point_at(0.0).distance(Vec2::new(-5.0, -5.0)) < 1e-3);
        assert!(arc.original_point_at(0.0).distance(Vec2::ZERO) < 1e-3);
    }

    #[test]
    fn test_sanity_clamp() {
        let arc = CircularArc::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(100.0, 0.0),
            50.0 * PI,
            20.0,
        )
        .unwrap();
        let p = arc.point_at(0.5);
        assert!(p.x <= 20.0 && p.y >= -20.0);
    }
}
