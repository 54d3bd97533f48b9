//! Resolved difficulty, mods and derived sizes, shared read-only by every
//! hit object

use glam::Vec2;

use crate::consts::*;
use crate::rules::{self, Difficulty, HitWindows};
use crate::settings::{GameplaySettings, Mods};

#[derive(Debug, Clone)]
pub struct GameContext {
    pub mods: Mods,
    /// Difficulty after Hard Rock / Easy
    pub difficulty: Difficulty,
    pub windows: HitWindows,
    /// Approach time in ms (millhioref applied)
    pub approach_time: f32,
    pub circle_diameter: f32,
    pub follow_diameter: f32,
    /// Playfield size in osu!pixels
    pub playfield: Vec2,
    pub settings: GameplaySettings,
}

impl GameContext {
    pub fn new(base: Difficulty, mods: Mods, settings: GameplaySettings) -> Self {
        let difficulty = base.with_mods(&mods);
        let mut approach_time = rules::approach_time(difficulty.ar);
        if mods.millhioref {
            approach_time *= settings.millhioref_multiplier;
        }

        log::debug!(
            "context: AR {:.1} CS {:.1} OD {:.1} HP {:.1}, approach {approach_time:.0} ms",
            difficulty.ar,
            difficulty.cs,
            difficulty.od,
            difficulty.hp
        );

        Self {
            mods,
            difficulty,
            windows: HitWindows::from_overall_difficulty(difficulty.od),
            approach_time,
            circle_diameter: rules::hit_circle_diameter(difficulty.cs),
            follow_diameter: rules::follow_circle_diameter(difficulty.cs),
            playfield: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            settings,
        }
    }

    /// Replace the OD-derived hit windows
    pub fn with_windows(mut self, windows: HitWindows) -> Self {
        self.windows = windows;
        self
    }

    #[inline]
    pub fn circle_radius(&self) -> f32 {
        self.circle_diameter / 2.0
    }

    #[inline]
    pub fn follow_radius(&self) -> f32 {
        self.follow_diameter / 2.0
    }

    /// Body fade-in time (ms), scaled by playback speed
    #[inline]
    pub fn fade_in_time(&self) -> f32 {
        self.settings.fade_in_time * self.mods.speed
    }

    /// Stack offset per stack level (osu!pixels)
    #[inline]
    pub fn stack_offset(&self) -> f32 {
        self.circle_diameter * STACK_OFFSET
    }
}

impl Default for GameContext {
    fn default() -> Self {
        Self::new(Difficulty::default(), Mods::default(), GameplaySettings::default())
    }
}
