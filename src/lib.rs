//! hitsim - gameplay simulation core for an osu!-style rhythm game
//!
//! Core modules:
//! - `curve`: Slider curve geometry (approximators, equal-distance resampler)
//! - `rules`: Hit windows, difficulty mapping and mod policy
//! - `sim`: Deterministic hit-object judgement (circles, sliders, spinners)
//! - `beatmap`: Scenario description and slider timing derivation
//! - `settings`: Data-driven gameplay configuration
//! - `bot`: Scripted player used by the headless runner

pub mod beatmap;
pub mod bot;
pub mod curve;
pub mod error;
pub mod rules;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use settings::{GameplaySettings, Mods, NotelockKind};

use glam::Vec2;

/// Gameplay constants
pub mod consts {
    /// Playfield dimensions in osu!pixels
    pub const PLAYFIELD_WIDTH: f32 = 512.0;
    pub const PLAYFIELD_HEIGHT: f32 = 384.0;

    /// Distance between resampled curve points
    pub const CURVE_POINT_SEPARATION: f32 = 2.5;
    /// Hard cap on resampled curve points
    pub const CURVE_MAX_POINTS: usize = 9999;
    /// Arc sample coordinates are clamped to +-this
    pub const CURVE_MAX_LENGTH: f32 = 32768.0;
    /// Bezier flatness tolerance
    pub const BEZIER_TOLERANCE: f32 = 0.25;

    /// Miss window (ms). Clicks further away than this are ignored.
    pub const HIT_WINDOW_MISS: f32 = 400.0;
    /// Hit object body fade-in (ms)
    pub const FADE_IN_TIME: f32 = 400.0;

    /// Approach circle starts at (1 + this) times the circle size
    pub const APPROACH_SCALE_MULTIPLIER: f32 = 3.0;

    /// Slider end is checked this many ms before it actually ends
    pub const SLIDER_END_INSIDE_CHECK_OFFSET: i64 = 36;
    /// Follow circle diameter relative to the hit circle
    pub const FOLLOW_CIRCLE_SCALE: f32 = 2.4;
    pub const SLIDER_MAX_TICKS: usize = 2048;

    /// Relax hits fire this many ms relative to the object time
    pub const RELAX_OFFSET: i64 = -12;

    /// Autoplay spin speed (radians per ms)
    pub const SPINNER_AUTO_MULTIPLIER: f32 = 1.0 / 20.0;
    pub const SPINNER_MAX_RPM: f32 = 477.0;

    /// Overlapping objects within this many ms don't lock each other
    pub const NOTELOCK_2B_TOLERANCE: i64 = 3;

    /// Stacked objects closer than this (osu!pixels) are stacked
    pub const STACK_LENIENCE: f32 = 3.0;
    /// Stack offset as a fraction of the circle diameter
    pub const STACK_OFFSET: f32 = 0.05;

    pub const BROKEN_GAMEFIELD_ROUNDING_ALLOWANCE: f32 = 1.00041;
}

/// Point `radius` away from `centre` in direction `angle` (radians, y down)
#[inline]
pub fn point_on_circle(centre: Vec2, radius: f32, angle: f32) -> Vec2 {
    centre + Vec2::from_angle(angle) * radius
}

/// Angle of `to` as seen from `from`, in degrees
#[inline]
pub fn angle_degrees(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_point_on_circle() {
        let centre = Vec2::new(256.0, 192.0);
        let below = point_on_circle(centre, 10.0, FRAC_PI_2);
        assert!(below.distance(Vec2::new(256.0, 202.0)) < 1e-4);
        assert!((angle_degrees(centre, below) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_degrees() {
        assert!((angle_degrees(Vec2::ZERO, Vec2::new(0.0, 5.0)) - 90.0).abs() < 1e-4);
        assert!((angle_degrees(Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)) - 180.0).abs() < 1e-4);
    }
}
