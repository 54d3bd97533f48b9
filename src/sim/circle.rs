//! Hit circles

use glam::Vec2;

use super::context::GameContext;
use super::input::{Click, FrameInput};
use super::judgement::{HitResult, Judgement, JudgementFlags, JudgementSink};
use super::object::HitObjectBase;
use crate::angle_degrees;

/// Where a circle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleState {
    Pending,
    /// Start time reached, not yet judged
    Waiting,
    Finished,
}

#[derive(Debug, Clone)]
pub struct Circle {
    pub base: HitObjectBase,
    original_pos: Vec2,
    pos: Vec2,
    waiting: bool,
    result: Option<HitResult>,
    /// Time of the last click swallowed by notelock
    shake_time: Option<i64>,
}

impl Circle {
    pub fn new(pos: Vec2, base: HitObjectBase) -> Self {
        Self {
            base,
            original_pos: pos,
            pos,
            waiting: false,
            result: None,
            shake_time: None,
        }
    }

    /// Stacked position
    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn original_pos(&self) -> Vec2 {
        self.original_pos
    }

    pub fn state(&self) -> CircleState {
        if self.base.finished {
            CircleState::Finished
        } else if self.waiting {
            CircleState::Waiting
        } else {
            CircleState::Pending
        }
    }

    pub fn result(&self) -> Option<HitResult> {
        self.result
    }

    pub fn shake_time(&self) -> Option<i64> {
        self.shake_time
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

        let mods = &ctx.mods;
        let delta = now - self.base.time;

        if mods.autoplay {
            if now >= self.base.time {
                self.on_hit(HitResult::Perfect, 0, None, sink);
            }
            return;
        }

        if mods.relax && now >= self.base.time + ctx.settings.relax_offset {
            let radius = ctx.circle_radius();
            let distance = input.cursor.distance(self.pos);
            if distance < radius {
                if let Some(result) = ctx.windows.judge(delta, mods) {
                    let target = (distance / radius, angle_degrees(self.pos, input.cursor));
                    self.on_hit(result, delta, Some(target), sink);
                    return;
                }
            }
        }

        self.waiting = delta >= 0;
        if self.waiting && delta > ctx.windows.auto_miss_after() {
            self.on_hit(HitResult::Miss, delta, None, sink);
        }
    }

    /// Try to consume the oldest pending click
    pub fn on_click(
        &mut self,
        clicks: &mut Vec<Click>,
        ctx: &GameContext,
        sink: &mut dyn JudgementSink,
    ) {
        if self.base.finished {
            return;
        }
        let Some(click) = clicks.first().copied() else {
            return;
        };

        let radius = ctx.circle_radius();
        let distance = click.pos.distance(self.pos);
        if distance >= radius {
            return;
        }

        if self.base.blocked {
            log::debug!("circle at {} ms: click at {} ms notelocked", self.base.time, click.time);
            self.shake_time = Some(click.time);
            return;
        }

        let delta = click.time - self.base.time;
        if let Some(result) = ctx.windows.judge(delta, &ctx.mods) {
            clicks.remove(0);
            let target = (distance / radius, angle_degrees(self.pos, click.pos));
            self.on_hit(result, delta, Some(target), sink);
        }
    }

    pub fn miss(&mut self, now: i64, sink: &mut dyn JudgementSink) {
        if self.base.finished {
            return;
        }
        self.on_hit(HitResult::Miss, now - self.base.time, None, sink);
    }

    fn on_hit(
        &mut self,
        result: HitResult,
        delta: i64,
        target: Option<(f32, f32)>,
        sink: &mut dyn JudgementSink,
    ) {
        let mut judgement = Judgement::new(result, delta, self.pos, JudgementFlags::OBJECT)
            .end_of_combo(self.base.end_of_combo);
        if let Some((target_delta, target_angle)) = target {
            judgement = judgement.with_target(target_delta, target_angle);
        }
        sink.on_judgement(&judgement);

        self.result = Some(result);
        self.base.finished = true;
    }

    pub fn reset(&mut self, now: i64) {
        self.waiting = false;
        self.shake_time = None;
        self.result = None;
        self.base.finished = self.base.time <= now;
    }

    pub fn update_stack_position(&mut self, offset: f32, hard_rock: bool) {
        let stack = self.base.stack as f32;
        let y_sign = if hard_rock { -1.0 } else { 1.0 };
        self.pos = self.original_pos - Vec2::new(stack * offset, stack * offset * y_sign);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Difficulty, HitWindows};
    use crate::settings::{GameplaySettings, Mods};
    use crate::sim::judgement::RecordingSink;

    const POS: Vec2 = Vec2::new(256.0, 192.0);

    fn ctx(mods: Mods) -> GameContext {
        GameContext::new(Difficulty::default(), mods, GameplaySettings::default())
            .with_windows(HitWindows::new(25.0, 60.0, 100.0, 150.0))
    }

    fn circle() -> Circle {
        Circle::new(POS, HitObjectBase::new(1000, 0))
    }

    fn click_at(circle: &mut Circle, time: i64, ctx: &GameContext, sink: &mut RecordingSink) {
        let input = FrameInput::new(POS, 16.0);
        circle.update(time, &input, ctx, sink);
        let mut clicks = vec![Click { pos: POS, time }];
        circle.on_click(&mut clicks, ctx, sink);
    }

    #[test]
    fn test_click_tiers() {
        let ctx = ctx(Mods::default());

        for (time, expected) in [(1010, HitResult::Perfect), (1080, HitResult::Meh)] {
            let mut c = circle();
            let mut sink = RecordingSink::new();
            click_at(&mut c, time, &ctx, &mut sink);
            assert_eq!(sink.results(), vec![expected]);
            assert_eq!(c.state(), CircleState::Finished);
        }
    }

    #[test]
    fn test_late_click_is_auto_missed() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        let mut sink = RecordingSink::new();
        click_at(&mut c, 1200, &ctx, &mut sink);
        assert_eq!(sink.results(), vec![HitResult::Miss]);
    }

    #[test]
    fn test_no_click_misses_after_meh_window() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        let mut sink = RecordingSink::new();
        let input = FrameInput::new(Vec2::ZERO, 16.0);

        c.update(1000, &input, &ctx, &mut sink);
        assert_eq!(c.state(), CircleState::Waiting);
        c.update(1100, &input, &ctx, &mut sink);
        assert!(sink.results().is_empty());
        c.update(1150, &input, &ctx, &mut sink);
        assert_eq!(sink.results(), vec![HitResult::Miss]);
    }

    #[test]
    fn test_only_first_click_consumed() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        let mut sink = RecordingSink::new();
        let mut clicks = vec![
            Click { pos: POS, time: 1005 },
            Click { pos: POS, time: 1006 },
        ];
        c.on_click(&mut clicks, &ctx, &mut sink);
        c.on_click(&mut clicks, &ctx, &mut sink);
        assert_eq!(sink.results(), vec![HitResult::Perfect]);
        assert_eq!(clicks.len(), 1);
    }

    #[test]
    fn test_click_outside_radius_ignored() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        let mut sink = RecordingSink::new();
        let mut clicks = vec![Click { pos: POS + Vec2::new(ctx.circle_radius() + 1.0, 0.0), time: 1000 }];
        c.on_click(&mut clicks, &ctx, &mut sink);
        assert!(sink.events.is_empty());
        assert_eq!(clicks.len(), 1);
    }

    #[test]
    fn test_blocked_click_shakes() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        c.base.blocked = true;
        let mut sink = RecordingSink::new();
        let mut clicks = vec![Click { pos: POS, time: 1000 }];
        c.on_click(&mut clicks, &ctx, &mut sink);
        assert!(sink.events.is_empty());
        assert_eq!(c.shake_time(), Some(1000));
        assert_eq!(clicks.len(), 1);
    }

    #[test]
    fn test_target_delta_and_angle() {
        let ctx = ctx(Mods::default());
        let mut c = circle();
        let mut sink = RecordingSink::new();
        let offset = Vec2::new(0.0, ctx.circle_radius() / 2.0);
        let mut clicks = vec![Click { pos: POS + offset, time: 1000 }];
        c.on_click(&mut clicks, &ctx, &mut sink);
        let j = sink.judgements().next().unwrap();
        assert!((j.target_delta.unwrap() - 0.5).abs() < 1e-5);
        assert!((j.target_angle.unwrap() - 90.0).abs() < 1e-3);
        assert!(j.flags.counts_for_accuracy);
    }

    #[test]
    fn test_autoplay_hits_at_start_time() {
        let ctx = ctx(Mods { autoplay: true, ..Mods::default() });
        let mut c = circle();
        let mut sink = RecordingSink::new();
        let input = FrameInput::default();
        c.update(999, &input, &ctx, &mut sink);
        assert!(sink.events.is_empty());
        c.update(1000, &input, &ctx, &mut sink);
        assert_eq!(sink.results(), vec![HitResult::Perfect]);
    }

    #[test]
    fn test_relax_hits_inside_radius() {
        let ctx = ctx(Mods { relax: true, ..Mods::default() });
        let mut sink = RecordingSink::new();

        let mut c = circle();
        c.update(987, &FrameInput::new(POS, 16.0), &ctx, &mut sink);
        assert!(sink.events.is_empty());
        c.update(988, &FrameInput::new(POS, 16.0), &ctx, &mut sink);
        assert_eq!(sink.results(), vec![HitResult::Perfect]);

        let mut away = circle();
        sink.clear();
        away.update(1000, &FrameInput::new(Vec2::ZERO, 16.0), &ctx, &mut sink);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut c = circle();
        c.reset(1000);
        assert_eq!(c.state(), CircleState::Finished);
        c.reset(999);
        assert_eq!(c.state(), CircleState::Pending);
        assert_eq!(c.result(), None);
    }

    #[test]
    fn test_stack_position() {
        let mut c = circle();
        c.base.stack = 2;
        c.update_stack_position(3.0, false);
        assert_eq!(c.pos(), POS - Vec2::new(6.0, 6.0));
        c.update_stack_position(3.0, true);
        assert_eq!(c.pos(), POS - Vec2::new(6.0, -6.0));
        assert_eq!(c.original_pos(), POS);
    }
}
