//! Spinners
//!
//! Rotation is measured from the cursor angle around the spinner centre and
//! smoothed through a ring buffer of per-frame deltas before it counts.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::context::GameContext;
use super::input::FrameInput;
use super::judgement::{HitResult, Judgement, JudgementFlags, JudgementSink};
use super::object::HitObjectBase;
use crate::consts::*;
use crate::{point_on_circle, rules};

/// Smoothing buffer length for a spinner of the given duration
#[inline]
fn ring_size(duration: i64) -> usize {
    ((duration - 2000) * 36 / 3000 + 12).clamp(12, 48) as usize
}

#[derive(Debug, Clone)]
pub struct Spinner {
    pub base: HitObjectBase,
    pos: Vec2,

    /// Accumulated rotation (degrees)
    rotations: f32,
    /// Whole rotations needed to clear
    rotations_needed: f32,
    /// rotations / needed, 1 = cleared
    ratio: f32,
    /// Remaining fraction of the spinner (1 at start, 0 at end)
    percent: f32,
    /// Signed rotation for display (degrees)
    draw_rotation: f32,
    rpm: f32,

    last_mouse_angle: f32,
    delta_overflow: f32,
    delta_angle_overflow: f32,
    delta_angles: Vec<f32>,
    delta_angle_index: usize,
    delta_angle_sum: f32,

    result: Option<HitResult>,
    /// Song time of the last seek, rebuilt on the next update
    seek_time: Option<i64>,
    /// Last frame covered by a rebuild; updates up to here are skipped
    rebuilt_until: Option<i64>,
}

/// Swallows events during a rebuild
struct Discard;

impl JudgementSink for Discard {
    fn on_judgement(&mut self, _: &Judgement) {}
    fn on_slider_break(&mut self) {}
    fn on_score_bonus(&mut self, _: u32) {}
}

impl Spinner {
    pub fn new(pos: Vec2, base: HitObjectBase) -> Self {
        let size = ring_size(base.duration);
        Self {
            base,
            pos,
            rotations: 0.0,
            rotations_needed: 0.0,
            ratio: 0.0,
            percent: 1.0,
            draw_rotation: 0.0,
            rpm: 0.0,
            last_mouse_angle: 0.0,
            delta_overflow: 0.0,
            delta_angle_overflow: 0.0,
            delta_angles: vec![0.0; size],
            delta_angle_index: 0,
            delta_angle_sum: 0.0,
            result: None,
            seek_time: None,
            rebuilt_until: None,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Accumulated rotation in degrees
    pub fn rotations(&self) -> f32 {
        self.rotations
    }

    pub fn rotations_needed(&self) -> f32 {
        self.rotations_needed
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn draw_rotation(&self) -> f32 {
        self.draw_rotation
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    pub fn result(&self) -> Option<HitResult> {
        self.result
    }

    pub fn update(
        &mut self,
        now: i64,
        input: &FrameInput,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        self.base.update_fade(now, true, ctx);
        if self.base.finished {
            return;
        }

        let mods = &ctx.mods;
        let t = self.base.time;
        let dur = self.base.duration;
        self.rotations_needed = rules::spinner_rotations_needed(ctx.difficulty.od, dur, mods.speed);

        if now >= t + dur {
            self.on_hit(ctx, sink);
            return;
        }

        let frame_ms = input.frame_ms;
        if frame_ms <= 0.0 {
            return;
        }

        if dur > 0 {
            self.percent = 1.0 - ((now - t) as f32 / dur as f32).clamp(0.0, 1.0);
        }

        let assisted = mods.autoplay || mods.autopilot || mods.spun_out;
        let angle_diff = if assisted {
            Self::assisted_step(frame_ms, mods.speed)
        } else {
            let offset = input.cursor - self.pos;
            let angle = offset.y.atan2(offset.x);
            let diff = angle - self.last_mouse_angle;
            if diff.abs() > 0.001 {
                self.last_mouse_angle = angle;
                diff
            } else {
                0.0
            }
        };

        if t - now > 0 {
            return;
        }

        if let Some(seek) = self.seek_time.take() {
            // only fully automated spinning can be reconstructed
            if mods.autoplay || mods.spun_out {
                self.rebuild(seek, frame_ms, mods.speed);
            }
        }
        if let Some(until) = self.rebuilt_until {
            if now <= until {
                return;
            }
            self.rebuilt_until = None;
        }

        let spinning = input.is_held() || mods.autoplay || mods.relax || mods.spun_out;
        self.spin(frame_ms, angle_diff, spinning, sink);
        self.update_ratio();
    }

    /// Angle an automated cursor turns in one frame (radians)
    #[inline]
    fn assisted_step(frame_ms: f32, speed: f32) -> f32 {
        frame_ms * SPINNER_AUTO_MULTIPLIER * speed
    }

    /// Feed one frame of cursor rotation through the smoothing buffer
    fn spin(&mut self, frame_ms: f32, mut angle_diff: f32, spinning: bool, sink: &mut dyn JudgementSink) {
        self.delta_overflow += frame_ms;

        if angle_diff < -PI {
            angle_diff += TAU;
        } else if angle_diff > PI {
            angle_diff -= TAU;
        }
        if spinning {
            self.delta_angle_overflow += angle_diff;
        }

        while self.delta_overflow >= frame_ms {
            let delta_angle = if spinning {
                self.delta_angle_overflow * frame_ms / self.delta_overflow
            } else {
                0.0
            };
            self.delta_angle_overflow -= delta_angle;
            self.delta_overflow -= frame_ms;

            let slot = self.delta_angle_index;
            self.delta_angle_sum += delta_angle - self.delta_angles[slot];
            self.delta_angles[slot] = delta_angle;
            self.delta_angle_index = (slot + 1) % self.delta_angles.len();

            let avg = self.delta_angle_sum / self.delta_angles.len() as f32;
            let rps = avg * (1000.0 / frame_ms) / TAU;
            let decay = 0.01f32.powf(frame_ms / 1000.0);
            self.rpm = (self.rpm * decay + (1.0 - decay) * rps.abs() * 60.0).min(SPINNER_MAX_RPM);

            if avg.abs() > 0.0001 {
                self.rotate(avg.to_degrees(), sink);
            }
        }
    }

    /// Nothing spun against a zero requirement counts as nothing
    fn update_ratio(&mut self) {
        self.ratio = if self.rotations_needed > 0.0 {
            self.rotations / (self.rotations_needed * 360.0)
        } else if self.rotations > 0.0 {
            1.0
        } else {
            0.0
        };
    }

    /// Replay automated spinning from the start up to `until`, as a run at
    /// a constant `frame_ms` starting on the spinner's start time would
    fn rebuild(&mut self, until: i64, frame_ms: f32, speed: f32) {
        let elapsed = (until - self.base.time) as f32;
        let frames = (elapsed / frame_ms).floor() as i64 + 1;
        let step = Self::assisted_step(frame_ms, speed);
        for _ in 0..frames {
            self.spin(frame_ms, step, true, &mut Discard);
        }
        self.update_ratio();
        self.rebuilt_until = Some(until);
        log::debug!(
            "spinner at {} ms: rebuilt {frames} frames up to {until} ms ({:.2} rotations)",
            self.base.time,
            self.rotations / 360.0
        );
    }

    /// Add rotation; every completed turn scores and refills health once
    fn rotate(&mut self, degrees: f32, sink: &mut dyn JudgementSink) {
        self.draw_rotation += degrees;

        let rotated = self.rotations + degrees.abs();
        let turns = (rotated / 360.0).floor();
        if turns > (self.rotations / 360.0).floor() {
            let (result, points) = if turns as i64 > self.rotations_needed as i64 + 1 {
                (HitResult::SpinnerBonus, HitResult::SpinnerBonus.score())
            } else {
                (HitResult::SpinnerSpin, HitResult::SpinnerSpin.score())
            };
            sink.on_judgement(&Judgement::new(result, 0, self.pos, JudgementFlags::HEALTH_ONLY));
            sink.on_score_bonus(points);
        }
        self.rotations = rotated;
    }

    fn tier(&self, ctx: &GameContext) -> HitResult {
        let mods = &ctx.mods;
        if self.ratio >= 1.0 || mods.autoplay {
            HitResult::Perfect
        } else if self.ratio >= 0.9 && !mods.ming3012 && !mods.no_100s {
            HitResult::Good
        } else if self.ratio >= 0.75 && !mods.no_100s && !mods.no_50s {
            HitResult::Meh
        } else {
            HitResult::Miss
        }
    }

    fn on_hit(&mut self, ctx: &GameContext, sink: &mut dyn JudgementSink) {
        let result = self.tier(ctx);
        log::debug!(
            "spinner at {} ms: {:.2} of {} rotations -> {}",
            self.base.time,
            self.rotations / 360.0,
            self.rotations_needed,
            result.as_str()
        );

        let judgement = Judgement::new(result, 0, self.pos, JudgementFlags::OBJECT)
            .end_of_combo(self.base.end_of_combo);
        sink.on_judgement(&judgement);

        self.result = Some(result);
        self.base.finished = true;
    }

    /// Restore the state implied by song time `now`. Automated spinning
    /// is rebuilt on the next update; manual spinning restarts from zero.
    /// The last cursor angle is kept so the next frame doesn't read a jump.
    pub fn reset(&mut self, now: i64) {
        self.rotations = 0.0;
        self.ratio = 0.0;
        self.percent = 1.0;
        self.draw_rotation = 0.0;
        self.rpm = 0.0;
        self.delta_overflow = 0.0;
        self.delta_angle_overflow = 0.0;
        self.delta_angles.fill(0.0);
        self.delta_angle_index = 0;
        self.delta_angle_sum = 0.0;
        self.result = None;
        self.base.finished = now > self.base.end_time();
        self.rebuilt_until = None;
        self.seek_time = (!self.base.finished && now >= self.base.time).then_some(now);
    }

    /// Circle traced by an automated cursor
    pub fn auto_cursor_pos(&self, now: i64, ctx: &GameContext) -> Vec2 {
        let delta = (now - self.base.time).clamp(0, self.base.duration.max(0)) as f32;
        let multiplier = if ctx.mods.autoplay || ctx.mods.autopilot {
            SPINNER_AUTO_MULTIPLIER
        } else {
            1.0
        };
        let angle = delta * multiplier - PI / 2.0;
        point_on_circle(self.pos, ctx.playfield.y / 10.0, angle)
    }
}
