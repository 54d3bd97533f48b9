//! Sliders
//!
//! A slider is judged in parts: the head (like a circle), every repeat and
//! tick (held and inside the follow circle at that instant), and the end,
//! whose tier comes from the share of successful parts.
//!
//! Two legacy quirks are reproduced on purpose:
//! - the end counts as held if the cursor was tracking at any point after
//!   `max(t + dur/2, t + dur - 36)`, not at the end itself
//! - tick times are mirrored on reverse traversals rather than recomputed

use glam::Vec2;

use super::context::GameContext;
use super::input::{Click, FrameInput, Key};
use super::judgement::{HitResult, Judgement, JudgementFlags, JudgementSink};
use super::object::HitObjectBase;
use crate::angle_degrees;
use crate::curve::{CurveParams, CurveType, ResampledCurve, build_curve};

/// Head judgement: combo and error bar, no accuracy or health
const HEAD_FLAGS: JudgementFlags = JudgementFlags {
    counts_for_accuracy: false,
    counts_for_combo: true,
    affects_health: false,
    shown_on_error_bar: true,
};

/// What a scheduled slider click stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderClickKind {
    /// `at_end` is true when the repeat happens on the end side of the body
    Repeat { at_end: bool },
    Tick { index: usize },
}

/// A repeat or tick, judged once when song time reaches it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderClick {
    pub time: i64,
    pub kind: SliderClickKind,
    pub finished: bool,
    pub successful: bool,
}

/// Authored tick position, shared by all traversals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderTick {
    pub percent: f32,
    /// All repeats of this tick have been judged
    pub finished: bool,
}

/// Everything needed to build a slider, already derived from timing points
#[derive(Debug, Clone, PartialEq)]
pub struct SliderDesc {
    pub curve_type: CurveType,
    pub points: Vec<Vec2>,
    /// Number of traversals (1 = no repeat)
    pub repeat: u32,
    pub pixel_length: f32,
    /// Total time including repeats (ms)
    pub slider_time: f32,
    pub slider_time_without_repeats: f32,
    pub tick_percents: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct Slider {
    pub base: HitObjectBase,
    curve_type: CurveType,
    repeat: u32,
    pixel_length: f32,
    slider_time: f32,
    slider_time_without_repeats: f32,
    curve: ResampledCurve,
    ticks: Vec<SliderTick>,
    clicks: Vec<SliderClick>,

    slide_percent: f32,
    actual_slide_percent: f32,
    cur_repeat: u32,
    in_reverse: bool,
    /// 0 none, 1 at start, 2 at end, 3 both
    reverse_arrow_pos: u8,
    cur_point: Vec2,
    body_alpha: f32,

    cursor_inside: bool,
    cursor_left: bool,
    fat_finger_key: Option<Key>,

    head_result: Option<HitResult>,
    end_result: Option<HitResult>,
    head_finished: bool,
    end_finished: bool,
    held_till_end: bool,
    held_for_lenience: bool,
    lenience_checked: bool,
    /// Last time the cursor was tracking under strict tracking (0 = never)
    strict_last_held: i64,
}

impl Slider {
    /// Build the curve and schedule repeats and ticks.
    ///
    /// `base.duration` is replaced by the slider time.
    pub fn new(desc: SliderDesc, mut base: HitObjectBase, params: &CurveParams) -> Self {
        let t = base.time;
        let tw = desc.slider_time_without_repeats;
        let repeat = desc.repeat.max(1);

        let curve = build_curve(desc.curve_type, &desc.points, desc.pixel_length, params);
        if curve.is_empty() {
            log::error!(
                "slider at {t} ms has no geometry ({} control points), it will be missed",
                desc.points.len()
            );
        }

        let ticks: Vec<SliderTick> = desc
            .tick_percents
            .iter()
            .map(|&percent| SliderTick {
                percent,
                finished: false,
            })
            .collect();

        let mut clicks = Vec::with_capacity((repeat as usize - 1) + repeat as usize * ticks.len());
        for i in 0..repeat - 1 {
            clicks.push(SliderClick {
                time: t + (tw * (i + 1) as f32) as i64,
                kind: SliderClickKind::Repeat { at_end: i % 2 == 0 },
                finished: false,
                successful: false,
            });
        }

        // ticks keep their position on the body, so reverse traversals
        // mirror the percentage
        for i in 0..repeat {
            for (index, tick) in ticks.iter().enumerate() {
                let percent = if (i + 1) % 2 != 0 {
                    tick.percent
                } else {
                    1.0 - tick.percent
                };
                clicks.push(SliderClick {
                    time: t + (tw * i as f32) as i64 + (percent * tw) as i64,
                    kind: SliderClickKind::Tick { index },
                    finished: false,
                    successful: false,
                });
            }
        }

        let duration = desc.slider_time as i64;
        base.duration = if duration >= 0 { duration } else { 1 };

        let start = if curve.is_empty() {
            Vec2::ZERO
        } else {
            curve.point_at(0.0)
        };

        Self {
            base,
            curve_type: desc.curve_type,
            repeat,
            pixel_length: desc.pixel_length,
            slider_time: desc.slider_time,
            slider_time_without_repeats: tw,
            curve,
            ticks,
            clicks,
            slide_percent: 0.0,
            actual_slide_percent: 0.0,
            cur_repeat: 0,
            in_reverse: false,
            reverse_arrow_pos: 0,
            cur_point: start,
            body_alpha: 0.0,
            cursor_inside: false,
            cursor_left: true,
            fat_finger_key: None,
            head_result: None,
            end_result: None,
            head_finished: false,
            end_finished: false,
            held_till_end: false,
            held_for_lenience: false,
            lenience_checked: false,
            strict_last_held: 0,
        }
    }

    // === Accessors ===

    pub fn curve(&self) -> &ResampledCurve {
        &self.curve
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn pixel_length(&self) -> f32 {
        self.pixel_length
    }

    pub fn slider_time_without_repeats(&self) -> f32 {
        self.slider_time_without_repeats
    }

    pub fn clicks(&self) -> &[SliderClick] {
        &self.clicks
    }

    pub fn ticks(&self) -> &[SliderTick] {
        &self.ticks
    }

    /// Position along the body in [0, 1], after repeat bouncing
    pub fn slide_percent(&self) -> f32 {
        self.slide_percent
    }

    /// Progress through the whole slider in [0, 1]
    pub fn actual_slide_percent(&self) -> f32 {
        self.actual_slide_percent
    }

    pub fn current_repeat(&self) -> u32 {
        self.cur_repeat
    }

    pub fn is_in_reverse(&self) -> bool {
        self.in_reverse
    }

    pub fn reverse_arrow_pos(&self) -> u8 {
        self.reverse_arrow_pos
    }

    /// Current follow circle position
    pub fn cur_point(&self) -> Vec2 {
        self.cur_point
    }

    pub fn body_alpha(&self) -> f32 {
        self.body_alpha
    }

    pub fn is_cursor_inside(&self) -> bool {
        self.cursor_inside
    }

    pub fn is_head_finished(&self) -> bool {
        self.head_finished
    }

    pub fn is_end_finished(&self) -> bool {
        self.end_finished
    }

    pub fn head_result(&self) -> Option<HitResult> {
        self.head_result
    }

    pub fn end_result(&self) -> Option<HitResult> {
        self.end_result
    }

    pub fn held_till_end(&self) -> bool {
        self.held_till_end
    }

    /// Combo of a perfect play: head, end, repeats and every tick pass
    pub fn max_combo(&self) -> u32 {
        let repeats = self.repeat.saturating_sub(1);
        2 + repeats + (repeats + 1) * self.ticks.len() as u32
    }

    /// Song time at which the end is considered held
    pub fn lenience_end_time(&self, ctx: &GameContext) -> i64 {
        let t = self.base.time;
        let dur = self.base.duration;
        (t + dur / 2).max(t + dur - ctx.settings.slider_end_inside_check_offset)
    }

    // === Positions ===

    /// Bounced curve parameter for a song time inside the slider
    fn bounce_t(&self, time: i64) -> f32 {
        let t = (time - self.base.time) as f32 / self.slider_time_without_repeats;
        let floor = t.floor();
        if (floor as i64) % 2 == 0 {
            t - floor
        } else {
            floor + 1.0 - t
        }
    }

    fn pos_at(&self, time: i64, original: bool) -> Vec2 {
        if self.curve.is_empty() {
            return Vec2::ZERO;
        }
        let point_at = |t: f32| {
            if original {
                self.curve.original_point_at(t)
            } else {
                self.curve.point_at(t)
            }
        };

        if time <= self.base.time {
            point_at(0.0)
        } else if time as f32 >= self.base.time as f32 + self.slider_time {
            if self.repeat % 2 == 0 {
                point_at(0.0)
            } else {
                point_at(1.0)
            }
        } else {
            point_at(self.bounce_t(time))
        }
    }

    /// Stacked position of the follow circle at `time`
    pub fn raw_pos_at(&self, time: i64) -> Vec2 {
        self.pos_at(time, false)
    }

    pub fn original_raw_pos_at(&self, time: i64) -> Vec2 {
        self.pos_at(time, true)
    }

    pub fn update_stack_position(&mut self, offset: f32, hard_rock: bool) {
        self.curve
            .update_stack_position(self.base.stack as f32 * offset, hard_rock);
    }

    // === Simulation ===

    /// Holding, with the fat-finger key excluded until it is released
    fn is_click_held(&self, input: &FrameInput) -> bool {
        match self.fat_finger_key {
            None => input.is_held(),
            Some(Key::K1) => input.key2,
            Some(Key::K2) => input.key1,
        }
    }

    pub fn update(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        self.base.update_fade(now, false, ctx);
        if self.base.finished {
            return;
        }

        if self.curve.is_empty() {
            if now >= self.base.time {
                let judgement = Judgement::new(HitResult::Miss, now - self.base.time, Vec2::ZERO, JudgementFlags::OBJECT)
                    .end_of_combo(self.base.end_of_combo);
                sink.on_judgement(&judgement);
                self.head_result = Some(HitResult::Miss);
                self.end_result = Some(HitResult::Miss);
                self.head_finished = true;
                self.end_finished = true;
                self.base.finished = true;
            }
            return;
        }

        let mods = ctx.mods;
        let t = self.base.time;
        let dur = self.base.duration;

        self.update_slide(now, ctx);

        // releasing the fat-finger key lifts the restriction
        match self.fat_finger_key {
            Some(Key::K1) if !input.key1 => self.fat_finger_key = None,
            Some(Key::K2) if !input.key2 => self.fat_finger_key = None,
            _ => {}
        }

        // the follow circle only grows while the cursor stays on it
        let follow_radius = if self.cursor_left {
            ctx.circle_radius()
        } else {
            ctx.follow_radius()
        };
        self.cursor_inside = mods.autoplay || input.cursor.distance(self.cur_point) < follow_radius;
        self.cursor_left = !self.cursor_inside;

        if !self.head_finished {
            self.update_head(now, input, ctx, sink);
        }

        if self.end_finished {
            return;
        }

        let strict = ctx.settings.strict_tracking && (self.head_finished || now >= t);
        let lenience_end = self.lenience_end_time(ctx);
        let tracking = (self.is_click_held(input) || mods.relax) && self.cursor_inside;

        if tracking {
            if strict {
                // 0 means "never tracked"
                self.strict_last_held = if now == 0 { 1 } else { now };
            }
            if now >= lenience_end && !self.lenience_checked {
                self.lenience_checked = true;
                self.held_for_lenience = true;
            }
        } else {
            self.cursor_left = true;
        }

        if now >= lenience_end {
            self.lenience_checked = true;
        }

        if strict
            && self.strict_last_held != 0
            && !tracking
            && !self.held_for_lenience
            && self.end_result.is_none()
        {
            log::debug!("slider at {t} ms: lost tracking at {now} ms");
            sink.on_slider_break();
            self.held_till_end = false;
            self.held_for_lenience = false;
            self.lenience_checked = true;
            self.end_result = Some(HitResult::Miss);

            let flags = JudgementFlags {
                counts_for_accuracy: true,
                counts_for_combo: false,
                affects_health: true,
                shown_on_error_bar: false,
            };
            let judgement = Judgement::new(HitResult::Miss, 0, self.raw_pos_at(t + dur), flags)
                .end_of_combo(self.base.end_of_combo);
            sink.on_judgement(&judgement);
        }

        let held = self.is_click_held(input);
        for i in 0..self.clicks.len() {
            if self.clicks[i].finished || now < self.clicks[i].time {
                continue;
            }
            let successful = (held && self.cursor_inside)
                || mods.autoplay
                || (mods.relax && self.cursor_inside);
            self.clicks[i].finished = true;
            self.clicks[i].successful = successful;

            match self.clicks[i].kind {
                SliderClickKind::Repeat { .. } => self.on_repeat_hit(successful, sink),
                SliderClickKind::Tick { index } => self.on_tick_hit(successful, index, sink),
            }
        }

        if now < t + dur {
            return;
        }

        if mods.autoplay {
            self.held_till_end = true;
            self.end_result = Some(HitResult::Perfect);
            self.on_end_hit(HitResult::Perfect, false, sink);
            return;
        }

        if self.head_result.is_none() {
            sink.on_slider_break();
            sink.on_judgement(&Judgement::new(
                HitResult::MissSliderBreak,
                0,
                self.cur_point,
                JudgementFlags::HEALTH_ONLY,
            ));
            self.head_result = Some(HitResult::Miss);
        }

        let (result, from_strict_tracking) = match self.end_result {
            Some(result) => (result, true),
            None => {
                self.held_till_end = self.held_for_lenience;
                let result = self.end_tier(ctx);
                if !self.held_till_end && ctx.settings.slider_end_miss_breaks_combo {
                    sink.on_slider_break();
                }
                (result, false)
            }
        };
        self.end_result = Some(result);
        self.on_end_hit(result, from_strict_tracking, sink);
    }

    /// Slide percent, repeat parity and follow point for this frame
    fn update_slide(&mut self, now: i64, ctx: &GameContext) {
        let t = self.base.time;
        let mut slide = 0.0;
        if now > t && self.slider_time > 0.0 {
            let elapsed = (now - t).clamp(0, self.slider_time as i64);
            slide = (elapsed as f32 / self.slider_time).clamp(0.0, 1.0);
        }
        self.actual_slide_percent = slide;

        self.body_alpha = self.base.fade.alpha;
        if ctx.mods.hidden {
            // body fades out over the slider's length
            self.body_alpha = self.base.fade.alpha_without_hidden;
            let approach = ctx.approach_time as i64;
            let fade_out_start = t.min(t - approach + ctx.fade_in_time() as i64);
            let fade_out_end = t + self.slider_time as i64;
            if now >= fade_out_start && fade_out_end > fade_out_start {
                let a = ((fade_out_end - now) as f32 / (fade_out_end - fade_out_start) as f32).clamp(0.0, 1.0);
                self.body_alpha = a * a;
            }
        }

        if slide > 0.0 || self.base.fade.visible {
            self.in_reverse = false;
            if self.repeat > 1 {
                let repeat = self.repeat as f32;
                let part = 1.0 / repeat;
                self.cur_repeat = (slide * repeat) as u32;
                let part_slide = (slide - part * self.cur_repeat as f32) / part;

                if self.cur_repeat % 2 == 0 {
                    slide = part_slide;
                    self.reverse_arrow_pos = 2;
                } else {
                    slide = 1.0 - part_slide;
                    self.reverse_arrow_pos = 1;
                    self.in_reverse = true;
                }

                if self.cur_repeat == self.repeat - 1 {
                    self.reverse_arrow_pos = 0;
                }
                if self.cur_repeat + 2 < self.repeat && slide > 0.0 && self.repeat > 2 {
                    self.reverse_arrow_pos = 3;
                }
            }
            self.slide_percent = slide;
            self.cur_point = self.curve.point_at(slide);
        } else {
            self.slide_percent = 0.0;
            self.cur_point = self.curve.point_at(0.0);
        }
    }

    fn update_head(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        let mods = &ctx.mods;
        let t = self.base.time;

        if mods.autoplay {
            if now >= t {
                self.on_head_hit(HitResult::Perfect, 0, None, input, sink);
            }
            return;
        }

        let delta = now - t;

        if mods.relax && now >= t + ctx.settings.relax_offset {
            let pos = self.curve.point_at(0.0);
            let radius = ctx.circle_radius();
            let distance = input.cursor.distance(pos);
            if distance < radius {
                if let Some(result) = ctx.windows.judge(delta, mods) {
                    let target = (distance / radius, angle_degrees(pos, input.cursor));
                    self.on_head_hit(result, delta, Some(target), input, sink);
                    return;
                }
            }
        }

        if delta >= 0 && delta > ctx.windows.auto_miss_after() {
            self.on_head_hit(HitResult::Miss, delta, None, input, sink);
        }
    }

    /// Tier of the end from the share of successful parts
    fn end_tier(&self, ctx: &GameContext) -> HitResult {
        let mods = &ctx.mods;
        let head = self.head_result.unwrap_or(HitResult::Miss);

        let max_hits = (2 + self.clicks.len()) as f32;
        let mut hits = 0.0;
        if head != HitResult::Miss {
            hits += 1.0;
        }
        if self.held_till_end {
            hits += 1.0;
        }
        hits += self.clicks.iter().filter(|c| c.successful).count() as f32;
        let percent = hits / max_hits;

        let (allow_perfect, allow_good) = if mods.score_v2 {
            (
                head == HitResult::Perfect,
                matches!(head, HitResult::Perfect | HitResult::Good),
            )
        } else {
            (true, true)
        };

        if percent >= 0.999 && allow_perfect {
            HitResult::Perfect
        } else if percent >= 0.5 && allow_good && !mods.ming3012 && !mods.no_100s {
            HitResult::Good
        } else if percent > 0.0 && !mods.no_100s && !mods.no_50s {
            HitResult::Meh
        } else {
            HitResult::Miss
        }
    }

    fn on_head_hit(
        &mut self,
        result: HitResult,
        delta: i64,
        target: Option<(f32, f32)>,
        input: &FrameInput,
        sink: &mut dyn JudgementSink,
    ) {
        if result == HitResult::Miss {
            sink.on_slider_break();
        }

        self.head_finished = true;
        self.head_result = Some(result);

        // with both keys down, the key pressed earlier is being rested on
        if input.key1 && input.key2 {
            self.fat_finger_key = Some(match input.last_pressed {
                Key::K1 => Key::K2,
                Key::K2 => Key::K1,
            });
        }

        let mut judgement = Judgement::new(result, delta, self.curve.point_at(0.0), HEAD_FLAGS);
        if let Some((target_delta, target_angle)) = target {
            judgement = judgement.with_target(target_delta, target_angle);
        }
        sink.on_judgement(&judgement);
        self.edge_health(result != HitResult::Miss, sink);
    }

    fn on_end_hit(&mut self, result: HitResult, from_strict_tracking: bool, sink: &mut dyn JudgementSink) {
        self.head_finished = true;
        self.end_finished = true;
        self.base.finished = true;

        if from_strict_tracking {
            return;
        }
        if result == HitResult::Miss {
            sink.on_slider_break();
        }

        let flags = JudgementFlags {
            counts_for_accuracy: true,
            counts_for_combo: self.held_till_end,
            affects_health: true,
            shown_on_error_bar: false,
        };
        let judgement = Judgement::new(result, 0, self.raw_pos_at(self.base.end_time()), flags)
            .end_of_combo(self.base.end_of_combo);
        sink.on_judgement(&judgement);
        self.edge_health(self.held_till_end, sink);
    }

    /// Health (and +30) for a head or end
    fn edge_health(&self, success: bool, sink: &mut dyn JudgementSink) {
        let result = if success {
            sink.on_score_bonus(HitResult::SliderRepeat.score());
            HitResult::SliderRepeat
        } else {
            HitResult::MissSliderBreak
        };
        sink.on_judgement(&Judgement::new(result, 0, self.cur_point, JudgementFlags::HEALTH_ONLY));
    }

    fn on_repeat_hit(&mut self, successful: bool, sink: &mut dyn JudgementSink) {
        self.part_hit(successful, HitResult::SliderRepeat, sink);
    }

    fn on_tick_hit(&mut self, successful: bool, index: usize, sink: &mut dyn JudgementSink) {
        let pending = self
            .clicks
            .iter()
            .any(|c| c.kind == SliderClickKind::Tick { index } && !c.finished);
        if let Some(tick) = self.ticks.get_mut(index) {
            tick.finished = !pending;
        }
        self.part_hit(successful, HitResult::SliderTick, sink);
    }

    fn part_hit(&mut self, successful: bool, result: HitResult, sink: &mut dyn JudgementSink) {
        if successful {
            sink.on_judgement(&Judgement::new(result, 0, self.cur_point, JudgementFlags::COMBO_ONLY));
            sink.on_score_bonus(result.score());
        } else {
            sink.on_slider_break();
            sink.on_judgement(&Judgement::new(
                HitResult::MissSliderBreak,
                0,
                self.cur_point,
                JudgementFlags::HEALTH_ONLY,
            ));
        }
    }

    /// Try the oldest pending click against the head
    pub fn on_click(
        &mut self,
        clicks: &mut Vec<Click>,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        // sliders don't shake when notelocked
        if self.curve.is_empty() || self.base.blocked || self.head_finished {
            return;
        }
        let Some(click) = clicks.first().copied() else {
            return;
        };

        let pos = self.curve.point_at(0.0);
        let radius = ctx.circle_radius();
        let distance = click.pos.distance(pos);
        if distance >= radius {
            return;
        }

        let delta = click.time - self.base.time;
        if let Some(result) = ctx.windows.judge(delta, &ctx.mods) {
            clicks.remove(0);
            let target = (distance / radius, angle_degrees(pos, click.pos));
            self.on_head_hit(result, delta, Some(target), input, sink);
        }
    }

    /// Miss everything not yet judged
    pub fn miss(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        if self.base.finished {
            return;
        }

        if !self.head_finished {
            self.on_head_hit(HitResult::Miss, now - self.base.time, None, input, sink);
        }

        if self.end_finished {
            return;
        }

        for i in 0..self.clicks.len() {
            if self.clicks[i].finished {
                continue;
            }
            self.clicks[i].finished = true;
            self.clicks[i].successful = false;
            match self.clicks[i].kind {
                SliderClickKind::Repeat { .. } => self.on_repeat_hit(false, sink),
                SliderClickKind::Tick { index } => self.on_tick_hit(false, index, sink),
            }
        }

        self.held_till_end = self.held_for_lenience;
        if !self.held_till_end && ctx.settings.slider_end_miss_breaks_combo {
            sink.on_slider_break();
        }
        self.end_result = Some(HitResult::Miss);
        self.on_end_hit(HitResult::Miss, false, sink);
    }

    /// Restore the state implied by song time `now`
    pub fn reset(&mut self, now: i64) {
        self.strict_last_held = 0;
        self.fat_finger_key = None;
        self.cursor_left = true;
        self.cursor_inside = false;
        self.held_till_end = false;
        self.held_for_lenience = false;
        self.lenience_checked = false;
        self.end_result = None;

        let t = self.base.time;
        let (head, end) = if t > now {
            (false, false)
        } else if now < t + self.base.duration {
            (true, false)
        } else {
            (true, true)
        };
        self.head_finished = head;
        // passed parts count as hit, like the clicks below
        self.head_result = head.then_some(HitResult::Perfect);
        self.end_finished = end;
        self.base.finished = end;

        for click in &mut self.clicks {
            let passed = now > click.time;
            click.finished = passed;
            click.successful = passed;
        }

        for (index, tick) in self.ticks.iter_mut().enumerate() {
            tick.finished = !self
                .clicks
                .iter()
                .any(|c| c.kind == SliderClickKind::Tick { index } && !c.finished);
        }
    }
}
