//! Visibility, approach circle and fade timing shared by all hit objects

use serde::{Deserialize, Serialize};

use super::context::GameContext;

/// Rendering-facing animation state of one object for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeState {
    pub visible: bool,
    /// Approach circle size relative to the hit circle (1 = touching)
    pub approach_scale: f32,
    /// Body alpha (Hidden applied)
    pub alpha: f32,
    pub alpha_without_hidden: f32,
    pub approach_alpha: f32,
    /// Colour multiplier for objects that cannot be hit yet
    pub hittable_dim: f32,
    /// Time until the object's start (ms, positive = not yet reached)
    pub delta: i64,
}

impl Default for FadeState {
    fn default() -> Self {
        Self {
            visible: false,
            approach_scale: 1.0,
            alpha: 0.0,
            alpha_without_hidden: 0.0,
            approach_alpha: 0.0,
            hittable_dim: 1.0,
            delta: 0,
        }
    }
}

/// 0 at `start`, 1 at `end`
#[inline]
fn ramp(start: i64, end: i64, now: i64) -> f32 {
    (1.0 - (end - now) as f32 / (end - start) as f32).clamp(0.0, 1.0)
}

/// Compute the fade state of an object starting at `click_time`.
///
/// Spinners pass `use_fade_in_as_approach` so they appear a fixed time
/// before they start regardless of AR.
pub fn update_fade(
    click_time: i64,
    duration: i64,
    now: i64,
    use_fade_in_as_approach: bool,
    ctx: &GameContext,
) -> FadeState {
    let settings = &ctx.settings;
    let fade_in = ctx.fade_in_time() as i64;
    let approach = if use_fade_in_as_approach {
        fade_in
    } else {
        ctx.approach_time as i64
    };
    let delta = click_time - now;

    let mut state = FadeState {
        delta,
        ..FadeState::default()
    };

    if now < click_time - approach || now >= click_time + duration {
        return state;
    }

    let scale = if approach > 0 {
        (delta as f32 / approach as f32).clamp(0.0, 1.0)
    } else {
        0.0
    };
    state.approach_scale = 1.0 + scale * settings.approach_scale_multiplier;

    // body fade always finishes by click_time, even if the fade-in is longer
    // than the approach
    let fade_start = click_time - approach;
    let fade_end = click_time.min(click_time - approach + fade_in);
    state.alpha = ramp(fade_start, fade_end, now);
    state.alpha_without_hidden = state.alpha;

    if ctx.mods.hidden {
        let hd = &settings.hidden;
        let at = |percent: f32| click_time - (approach as f32 * percent) as i64;

        state.alpha = ramp(at(hd.fade_in_start), at(hd.fade_in_end), now);

        let fade_out_start = at(hd.fade_out_start);
        let fade_out_end = at(hd.fade_out_end);
        if now >= fade_out_start {
            state.alpha = 1.0 - ramp(fade_out_start, fade_out_end, now);
        }
    }

    let approach_fade_end = click_time.min(click_time - approach + 2 * fade_in);
    state.approach_alpha = ramp(fade_start, approach_fade_end, now);

    if settings.hittable_dim {
        // the un-dim ramp cuts into the clickable range
        let dim_start = click_time - ctx.windows.miss as i64;
        let dim_end = dim_start + settings.hittable_dim_duration;
        let t = ramp(dim_start, dim_end, now);
        state.hittable_dim = settings.hittable_dim_start + (1.0 - settings.hittable_dim_start) * t;
    }

    state.visible = true;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Difficulty;
    use crate::settings::{GameplaySettings, Mods};

    fn ctx(mods: Mods) -> GameContext {
        GameContext::new(Difficulty::default(), mods, GameplaySettings::default())
    }

    #[test]
    fn test_visibility_window() {
        let ctx = ctx(Mods::default());
        // approach 1200
        assert!(!update_fade(2000, 0, 799, false, &ctx).visible);
        assert!(update_fade(2000, 0, 800, false, &ctx).visible);
        assert!(update_fade(2000, 500, 2499, false, &ctx).visible);
        assert!(!update_fade(2000, 500, 2500, false, &ctx).visible);
    }

    #[test]
    fn test_approach_scale_and_alpha() {
        let ctx = ctx(Mods::default());
        let start = update_fade(2000, 0, 800, false, &ctx);
        assert_eq!(start.approach_scale, 4.0);
        assert_eq!(start.alpha, 0.0);

        let faded_in = update_fade(2000, 100, 1200, false, &ctx);
        assert_eq!(faded_in.alpha, 1.0);
        // doubled fade-in for the approach circle
        assert!((faded_in.approach_alpha - 0.5).abs() < 1e-6);

        let half = update_fade(2000, 100, 1000, false, &ctx);
        assert!((half.alpha - 0.5).abs() < 1e-6);
        assert!((half.approach_alpha - 0.25).abs() < 1e-6);

        let hit_time = update_fade(2000, 100, 2000, false, &ctx);
        assert_eq!(hit_time.approach_scale, 1.0);
    }

    #[test]
    fn test_hidden_fades_out_before_hit() {
        let ctx = ctx(Mods { hidden: true, ..Mods::default() });
        // fade in 800..1280, fade out 1280..1640
        assert_eq!(update_fade(2000, 0, 800, false, &ctx).alpha, 0.0);
        let peak = update_fade(2000, 0, 1270, false, &ctx);
        assert!(peak.alpha > 0.5 && peak.alpha < 1.0);
        assert_eq!(update_fade(2000, 0, 1640, false, &ctx).alpha, 0.0);
        assert_eq!(update_fade(2000, 0, 1640, false, &ctx).alpha_without_hidden, 1.0);
    }

    #[test]
    fn test_hittable_dim() {
        let ctx = ctx(Mods::default());
        let dim = update_fade(2000, 0, 1000, false, &ctx);
        assert!((dim.hittable_dim - 0.7647).abs() < 1e-6);
        let undimmed = update_fade(2000, 0, 1700, false, &ctx);
        assert!((undimmed.hittable_dim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_spinner_uses_fade_in_time() {
        let ctx = ctx(Mods::default());
        assert!(!update_fade(2000, 1000, 1599, true, &ctx).visible);
        assert!(update_fade(2000, 1000, 1600, true, &ctx).visible);
    }
}
