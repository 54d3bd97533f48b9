//! Hit object enum and the state shared by all variants

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::circle::Circle;
use super::context::GameContext;
use super::fade::{FadeState, update_fade};
use super::input::{Click, FrameInput};
use super::judgement::JudgementSink;
use super::slider::Slider;
use super::spinner::Spinner;

/// Hitsound descriptor, carried through untouched for the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HitSamples {
    pub hit_sound: u8,
    pub sample_set: u8,
    pub addition_set: u8,
    pub volume: u8,
}

/// Fields common to circles, sliders and spinners
#[derive(Debug, Clone)]
pub struct HitObjectBase {
    /// Start time (ms)
    pub time: i64,
    /// 0 for circles
    pub duration: i64,
    pub combo_number: u32,
    pub colour_index: u32,
    /// Last object of its combo
    pub end_of_combo: bool,
    pub stack: i32,
    pub samples: HitSamples,
    pub(crate) finished: bool,
    pub(crate) blocked: bool,
    pub(crate) fade: FadeState,
}

impl HitObjectBase {
    pub fn new(time: i64, duration: i64) -> Self {
        Self {
            time,
            duration,
            combo_number: 1,
            colour_index: 0,
            end_of_combo: false,
            stack: 0,
            samples: HitSamples::default(),
            finished: false,
            blocked: false,
            fade: FadeState::default(),
        }
    }

    #[inline]
    pub fn end_time(&self) -> i64 {
        self.time + self.duration
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    #[inline]
    pub fn fade(&self) -> &FadeState {
        &self.fade
    }

    pub(crate) fn update_fade(&mut self, now: i64, use_fade_in_as_approach: bool, ctx: &GameContext) {
        self.fade = update_fade(self.time, self.duration, now, use_fade_in_as_approach, ctx);
    }
}

/// A playable object
#[derive(Debug, Clone)]
pub enum HitObject {
    Circle(Circle),
    Slider(Slider),
    Spinner(Spinner),
}

impl HitObject {
    pub fn base(&self) -> &HitObjectBase {
        match self {
            HitObject::Circle(c) => &c.base,
            HitObject::Slider(s) => &s.base,
            HitObject::Spinner(s) => &s.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut HitObjectBase {
        match self {
            HitObject::Circle(c) => &mut c.base,
            HitObject::Slider(s) => &mut s.base,
            HitObject::Spinner(s) => &mut s.base,
        }
    }

    #[inline]
    pub fn time(&self) -> i64 {
        self.base().time
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.base().duration
    }

    #[inline]
    pub fn end_time(&self) -> i64 {
        self.base().end_time()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.base().finished
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.base_mut().blocked = blocked;
    }

    pub fn is_spinner(&self) -> bool {
        matches!(self, HitObject::Spinner(_))
    }

    /// True for sliders whose head has been judged
    pub fn is_slider_head_finished(&self) -> bool {
        match self {
            HitObject::Slider(s) => s.is_head_finished(),
            _ => false,
        }
    }

    /// Advance to song time `now`
    pub fn update(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        match self {
            HitObject::Circle(c) => c.update(now, input, ctx, sink),
            HitObject::Slider(s) => s.update(now, input, ctx, sink),
            HitObject::Spinner(s) => s.update(now, input, ctx, sink),
        }
    }

    /// Offer the oldest pending click. A consumed click is removed.
    pub fn on_click(
        &mut self,
        clicks: &mut Vec<Click>,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        match self {
            HitObject::Circle(c) => c.on_click(clicks, ctx, sink),
            HitObject::Slider(s) => s.on_click(clicks, input, ctx, sink),
            // spinners judge rotation, not clicks
            HitObject::Spinner(_) => {}
        }
    }

    /// Force-finish everything still pending as a miss
    pub fn miss(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        match self {
            HitObject::Circle(c) => c.miss(now, sink),
            HitObject::Slider(s) => s.miss(now, input, ctx, sink),
            HitObject::Spinner(_) => {}
        }
    }

    /// Restore the state implied by song time `now` (seeking)
    pub fn reset(&mut self, now: i64) {
        match self {
            HitObject::Circle(c) => c.reset(now),
            HitObject::Slider(s) => s.reset(now),
            HitObject::Spinner(s) => s.reset(now),
        }
    }

    pub fn update_stack_position(&mut self, offset: f32, hard_rock: bool) {
        match self {
            HitObject::Circle(c) => c.update_stack_position(offset, hard_rock),
            HitObject::Slider(s) => s.update_stack_position(offset, hard_rock),
            // spinners never stack
            HitObject::Spinner(_) => {}
        }
    }

    /// Stacked position at the start of the object
    pub fn start_pos(&self) -> Vec2 {
        match self {
            HitObject::Circle(c) => c.pos(),
            HitObject::Slider(s) => s.raw_pos_at(s.base.time),
            HitObject::Spinner(s) => s.pos(),
        }
    }

    /// Stacked position at the end of the object
    pub fn end_pos(&self) -> Vec2 {
        match self {
            HitObject::Circle(c) => c.pos(),
            HitObject::Slider(s) => s.raw_pos_at(s.base.end_time()),
            HitObject::Spinner(s) => s.pos(),
        }
    }

    /// Position before stacking was applied
    pub fn original_start_pos(&self) -> Vec2 {
        match self {
            HitObject::Circle(c) => c.original_pos(),
            HitObject::Slider(s) => s.original_raw_pos_at(s.base.time),
            HitObject::Spinner(s) => s.pos(),
        }
    }

    pub fn original_end_pos(&self) -> Vec2 {
        match self {
            HitObject::Circle(c) => c.original_pos(),
            HitObject::Slider(s) => s.original_raw_pos_at(s.base.end_time()),
            HitObject::Spinner(s) => s.pos(),
        }
    }

    /// Where a perfect player's cursor is at `now`
    pub fn auto_cursor_pos(&self, now: i64, ctx: &GameContext) -> Vec2 {
        match self {
            HitObject::Circle(c) => c.pos(),
            HitObject::Slider(s) => s.raw_pos_at(now),
            HitObject::Spinner(s) => s.auto_cursor_pos(now, ctx),
        }
    }

    /// Combo contributed by a fully successful play
    pub fn max_combo(&self) -> u32 {
        match self {
            HitObject::Slider(s) => s.max_combo(),
            _ => 1,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            HitObject::Circle(_) => "circle",
            HitObject::Slider(_) => "slider",
            HitObject::Spinner(_) => "spinner",
        }
    }
}

impl From<Circle> for HitObject {
    fn from(c: Circle) -> Self {
        HitObject::Circle(c)
    }
}

impl From<Slider> for HitObject {
    fn from(s: Slider) -> Self {
        HitObject::Slider(s)
    }
}

impl From<Spinner> for HitObject {
    fn from(s: Spinner) -> Self {
        HitObject::Spinner(s)
    }
}
