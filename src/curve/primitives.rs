//! Arc-length helpers shared by all curve types

use glam::Vec2;

/// A polyline produced by one approximator run, with the distance of every
/// point from its predecessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApproximatedSegment {
    points: Vec<Vec2>,
    /// `distances[0]` is always 0
    distances: Vec<f32>,
    total: f32,
}

impl ApproximatedSegment {
    pub fn from_points(points: Vec<Vec2>) -> Self {
        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            let d = if i == 0 { 0.0 } else { p.distance(points[i - 1]) };
            distances.push(d);
            total += d;
        }
        Self {
            points,
            distances,
            total,
        }
    }

    /// Sample a parametric curve uniformly over [0, 1], one point per
    /// 4 units of approximate length (at least 2 points).
    pub fn sample(approx_length: f32, point_at: impl Fn(f32) -> Vec2) -> Self {
        let num_points = ((approx_length / 4.0) as i32).max(0) as usize + 2;
        let last = (num_points - 1) as f32;
        let points = (0..num_points).map(|i| point_at(i as f32 / last)).collect();
        Self::from_points(points)
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    #[inline]
    pub fn total_distance(&self) -> f32 {
        self.total
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Summed point-to-point distance
pub fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distances() {
        let seg = ApproximatedSegment::from_points(vec![
            Vec2::ZERO,
            Vec2::new(3.0, 4.0),
            Vec2::new(3.0, 10.0),
        ]);
        assert_eq!(seg.distances(), &[0.0, 5.0, 6.0]);
        assert_eq!(seg.total_distance(), 11.0);
        assert_eq!(seg.len(), 3);
    }

    #[test]
    fn test_empty_segment() {
        let seg = ApproximatedSegment::from_points(Vec::new());
        assert!(seg.is_empty());
        assert_eq!(seg.total_distance(), 0.0);
    }

    #[test]
    fn test_sample_point_count() {
        // 10 / 4 = 2, plus the two endpoints
        let seg = ApproximatedSegment::sample(10.0, |t| Vec2::new(t * 10.0, 0.0));
        assert_eq!(seg.len(), 4);
        assert_eq!(seg.points()[0], Vec2::ZERO);
        assert_eq!(seg.points()[3], Vec2::new(10.0, 0.0));

        let tiny = ApproximatedSegment::sample(0.0, |t| Vec2::new(t, t));
        assert_eq!(tiny.len(), 2);
    }

    #[test]
    fn test_polyline_length() {
        let pts = [Vec2::ZERO, Vec2::new(0.0, 2.0), Vec2::new(2.0, 2.0)];
        assert_eq!(polyline_length(&pts), 4.0);
        assert_eq!(polyline_length(&pts[..1]), 0.0);
    }
}
