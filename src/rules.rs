//! Timing and mods policy
//!
//! Pure functions mapping difficulty settings and mods onto hit windows,
//! approach times, object sizes and spinner requirements.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::Mods;
use crate::sim::HitResult;

/// Interpolate a 0..10 difficulty value through three anchor values at 0, 5
/// and 10
#[inline]
pub fn map_difficulty_range(diff: f32, min: f32, mid: f32, max: f32) -> f32 {
    if diff > 5.0 {
        mid + (max - mid) * (diff - 5.0) / 5.0
    } else if diff < 5.0 {
        mid - (mid - min) * (5.0 - diff) / 5.0
    } else {
        mid
    }
}

/// Base difficulty settings of a map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Approach rate
    pub ar: f32,
    /// Circle size
    pub cs: f32,
    /// Overall difficulty
    pub od: f32,
    /// HP drain
    pub hp: f32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            ar: 5.0,
            cs: 5.0,
            od: 5.0,
            hp: 5.0,
        }
    }
}

impl Difficulty {
    /// Apply Hard Rock / Easy scaling. Results are clamped to 0..=10.
    pub fn with_mods(&self, mods: &Mods) -> Self {
        let mut d = *self;
        if mods.hard_rock {
            d.ar *= 1.4;
            d.od *= 1.4;
            d.hp *= 1.4;
            d.cs *= 1.3;
        }
        if mods.easy {
            d.ar *= 0.5;
            d.od *= 0.5;
            d.hp *= 0.5;
            d.cs *= 0.5;
        }
        d.ar = d.ar.clamp(0.0, 10.0);
        d.od = d.od.clamp(0.0, 10.0);
        d.hp = d.hp.clamp(0.0, 10.0);
        d.cs = d.cs.clamp(0.0, 10.0);
        d
    }
}

/// Approach time (ms) for an approach rate: 1800 / 1200 / 450
#[inline]
pub fn approach_time(ar: f32) -> f32 {
    map_difficulty_range(ar, 1800.0, 1200.0, 450.0)
}

/// Hit circle diameter in osu!pixels. Goes to zero above CS ~12.14.
pub fn hit_circle_diameter(cs: f32) -> f32 {
    (((1.0 - 0.7 * (cs - 5.0) / 5.0) / 2.0) * 128.0 * BROKEN_GAMEFIELD_ROUNDING_ALLOWANCE).max(0.0)
}

#[inline]
pub fn follow_circle_diameter(cs: f32) -> f32 {
    hit_circle_diameter(cs) * FOLLOW_CIRCLE_SCALE
}

#[inline]
pub fn spinner_spins_per_second(od: f32) -> f32 {
    map_difficulty_range(od, 3.0, 5.0, 7.5)
}

/// Whole rotations required to clear a spinner. Faster playback never
/// raises the requirement.
pub fn spinner_rotations_needed(od: f32, duration: i64, speed: f32) -> f32 {
    let raw = duration as f32 / 1000.0 * spinner_spins_per_second(od) * 0.5;
    let speed_factor = if speed > 0.0 { (1.0 / speed).min(1.0) } else { 1.0 };
    ((raw * speed_factor) as i32) as f32
}

/// Health change (fraction of the bar) for a result at the given HP
pub fn health_increase(result: HitResult, hp: f32) -> f64 {
    let hp = hp as f64;
    let map = |min: f64, mid: f64, max: f64| {
        if hp > 5.0 {
            mid + (max - mid) * (hp - 5.0) / 5.0
        } else if hp < 5.0 {
            mid - (mid - min) * (5.0 - hp) / 5.0
        } else {
            mid
        }
    };
    let raw = match result {
        HitResult::Miss => map(-6.0, -25.0, -40.0),
        HitResult::MissSliderBreak => map(-4.0, -15.0, -28.0),
        HitResult::Meh => map(0.4 * 8.0, 0.4, 0.4),
        HitResult::Good => map(2.2 * 8.0, 2.2, 2.2),
        HitResult::Perfect => 6.0,
        HitResult::SliderTick => 3.0,
        HitResult::SliderRepeat => 4.0,
        HitResult::SpinnerSpin => 1.7,
        HitResult::SpinnerBonus => 2.0,
    };
    raw / 200.0
}

/// Hit windows in ms, in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitWindows {
    pub perfect: f32,
    pub good: f32,
    pub meh: f32,
    /// Clicks further away than this are not judged at all
    pub miss: f32,
}

impl Default for HitWindows {
    fn default() -> Self {
        Self::from_overall_difficulty(5.0)
    }
}

/// "Stable-like" window edge
#[inline]
fn edge(window: f32) -> f32 {
    window.floor() - 0.5
}

impl HitWindows {
    pub fn new(perfect: f32, good: f32, meh: f32, miss: f32) -> Self {
        Self {
            perfect,
            good,
            meh,
            miss,
        }
    }

    /// Windows for an overall difficulty: 80/50/20, 140/100/60, 200/150/100
    pub fn from_overall_difficulty(od: f32) -> Self {
        Self {
            perfect: map_difficulty_range(od, 80.0, 50.0, 20.0),
            good: map_difficulty_range(od, 140.0, 100.0, 60.0),
            meh: map_difficulty_range(od, 200.0, 150.0, 100.0),
            miss: HIT_WINDOW_MISS,
        }
    }

    /// Windows in real time at the given playback speed
    pub fn scaled(&self, speed: f32) -> Self {
        if speed <= 0.0 {
            return *self;
        }
        Self {
            perfect: self.perfect / speed,
            good: self.good / speed,
            meh: self.meh / speed,
            miss: self.miss / speed,
        }
    }

    /// Tier for a signed delta (negative = early). `None` means the click
    /// is too far away to count for anything.
    pub fn judge(&self, delta: i64, mods: &Mods) -> Option<HitResult> {
        let abs = (delta as f32).abs();

        if abs > edge(self.miss) {
            return None;
        }

        // late hits are misses, except (optionally) late perfects
        if mods.half_window && delta > 0 && (abs > edge(self.perfect) || !mods.half_window_allow_300s) {
            return Some(HitResult::Miss);
        }

        if abs < edge(self.perfect) {
            Some(HitResult::Perfect)
        } else if abs < edge(self.good) && !(mods.no_100s || mods.ming3012) {
            Some(HitResult::Good)
        } else if abs < edge(self.meh) && !(mods.no_100s || mods.no_50s) {
            Some(HitResult::Meh)
        } else {
            Some(HitResult::Miss)
        }
    }

    /// Whole-ms lateness after which an unclicked object is missed
    #[inline]
    pub fn auto_miss_after(&self) -> i64 {
        self.meh as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario_windows() -> HitWindows {
        HitWindows::new(25.0, 60.0, 100.0, 150.0)
    }

    #[test]
    fn test_map_difficulty_range() {
        assert_eq!(map_difficulty_range(0.0, 1800.0, 1200.0, 450.0), 1800.0);
        assert_eq!(map_difficulty_range(5.0, 1800.0, 1200.0, 450.0), 1200.0);
        assert_eq!(map_difficulty_range(10.0, 1800.0, 1200.0, 450.0), 450.0);
        assert_eq!(approach_time(9.0), 600.0);
    }

    #[test]
    fn test_windows_from_od() {
        let w = HitWindows::from_overall_difficulty(10.0);
        assert_eq!((w.perfect, w.good, w.meh, w.miss), (20.0, 60.0, 100.0, 400.0));
        let w = HitWindows::from_overall_difficulty(5.0);
        assert_eq!((w.perfect, w.good, w.meh), (50.0, 100.0, 150.0));
    }

    #[test]
    fn test_scenario_tiers() {
        let w = scenario_windows();
        let mods = Mods::default();
        assert_eq!(w.judge(10, &mods), Some(HitResult::Perfect));
        assert_eq!(w.judge(80, &mods), Some(HitResult::Meh));
        assert_eq!(w.judge(-50, &mods), Some(HitResult::Good));
        assert_eq!(w.judge(120, &mods), Some(HitResult::Miss));
        assert_eq!(w.judge(200, &mods), None);
    }

    #[test]
    fn test_stable_like_edges() {
        // a 25 ms window accepts 24 but not 25
        let w = scenario_windows();
        let mods = Mods::default();
        assert_eq!(w.judge(24, &mods), Some(HitResult::Perfect));
        assert_eq!(w.judge(25, &mods), Some(HitResult::Good));
        assert_eq!(w.judge(149, &mods), Some(HitResult::Miss));
        assert_eq!(w.judge(150, &mods), None);
    }

    #[test]
    fn test_tier_mods() {
        let w = scenario_windows();

        let no100 = Mods { no_100s: true, ..Mods::default() };
        assert_eq!(w.judge(40, &no100), Some(HitResult::Miss));
        assert_eq!(w.judge(80, &no100), Some(HitResult::Miss));

        let no50 = Mods { no_50s: true, ..Mods::default() };
        assert_eq!(w.judge(40, &no50), Some(HitResult::Good));
        assert_eq!(w.judge(80, &no50), Some(HitResult::Miss));

        let ming = Mods { ming3012: true, ..Mods::default() };
        assert_eq!(w.judge(40, &ming), Some(HitResult::Meh));
    }

    #[test]
    fn test_half_window() {
        let w = scenario_windows();
        let half = Mods { half_window: true, ..Mods::default() };
        assert_eq!(w.judge(-40, &half), Some(HitResult::Good));
        assert_eq!(w.judge(5, &half), Some(HitResult::Miss));

        let allow = Mods { half_window_allow_300s: true, ..half };
        assert_eq!(w.judge(5, &allow), Some(HitResult::Perfect));
        assert_eq!(w.judge(40, &allow), Some(HitResult::Miss));
    }

    #[test]
    fn test_scaled_windows() {
        let w = HitWindows::new(30.0, 60.0, 90.0, 400.0).scaled(1.5);
        assert_eq!((w.perfect, w.good, w.meh), (20.0, 40.0, 60.0));
    }

    #[test]
    fn test_difficulty_mods() {
        let base = Difficulty { ar: 9.0, cs: 4.0, od: 8.0, hp: 6.0 };
        let hr = base.with_mods(&Mods { hard_rock: true, ..Mods::default() });
        assert_eq!(hr.ar, 10.0);
        assert!((hr.cs - 5.2).abs() < 1e-5);
        assert_eq!(hr.od, 10.0);

        let ez = base.with_mods(&Mods { easy: true, ..Mods::default() });
        assert_eq!(ez.ar, 4.5);
        assert_eq!(ez.cs, 2.0);
    }

    #[test]
    fn test_circle_diameter() {
        assert!((hit_circle_diameter(5.0) - 64.0 * 1.00041).abs() < 1e-3);
        assert_eq!(hit_circle_diameter(13.0), 0.0);
        assert!((follow_circle_diameter(5.0) / hit_circle_diameter(5.0) - 2.4).abs() < 1e-5);
    }

    #[test]
    fn test_spinner_rotations() {
        // OD 5: 5 spins/s, halved
        assert_eq!(spinner_rotations_needed(5.0, 2000, 1.0), 5.0);
        assert_eq!(spinner_rotations_needed(5.0, 2000, 0.75), 5.0);
        assert_eq!(spinner_rotations_needed(5.0, 3000, 1.5), 5.0);
    }

    #[test]
    fn test_health_signs() {
        assert!(health_increase(HitResult::Miss, 5.0) < 0.0);
        assert!(health_increase(HitResult::MissSliderBreak, 5.0) < 0.0);
        assert!(health_increase(HitResult::Perfect, 5.0) > health_increase(HitResult::Meh, 5.0));
        assert_eq!(health_increase(HitResult::Miss, 5.0), -25.0 / 200.0);
    }

    fn rank(r: Option<HitResult>) -> u8 {
        match r {
            Some(HitResult::Perfect) => 0,
            Some(HitResult::Good) => 1,
            Some(HitResult::Meh) => 2,
            Some(HitResult::Miss) => 3,
            _ => 4,
        }
    }

    proptest! {
        #[test]
        fn prop_tiers_are_monotonic(od in 0.0f32..=10.0, a in 0i64..500, b in 0i64..500) {
            let w = HitWindows::from_overall_difficulty(od);
            let mods = Mods::default();
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank(w.judge(near, &mods)) <= rank(w.judge(far, &mods)));
            prop_assert_eq!(w.judge(near, &mods), w.judge(-near, &mods));
        }
    }
}
