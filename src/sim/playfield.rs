//! Per-frame driver over all hit objects
//!
//! Objects are updated in start-time order. Notelock decides which objects
//! may take clicks this frame, then every visible object gets a chance at
//! the oldest pending click. Clicks nobody wanted are dropped at the end of
//! the frame.

use glam::Vec2;

use super::context::GameContext;
use super::input::{Click, FrameInput};
use super::judgement::JudgementSink;
use super::object::HitObject;
use crate::consts::NOTELOCK_2B_TOLERANCE;
use crate::settings::NotelockKind;

pub struct Playfield {
    objects: Vec<HitObject>,
    ctx: GameContext,
    /// Clicks not yet consumed this frame
    clicks: Vec<Click>,
}

impl Playfield {
    /// Objects are sorted by start time (stable for equal times)
    pub fn new(mut objects: Vec<HitObject>, ctx: GameContext) -> Self {
        objects.sort_by_key(|o| o.time());
        log::info!(
            "playfield: {} objects, notelock {}",
            objects.len(),
            ctx.settings.notelock.as_str()
        );
        Self {
            objects,
            ctx,
            clicks: Vec::new(),
        }
    }

    pub fn objects(&self) -> &[HitObject] {
        &self.objects
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    /// Time range around `now` in which objects are looked at (ms)
    pub fn pvs(&self) -> i64 {
        self.ctx.approach_time as i64 + self.ctx.fade_in_time() as i64 + self.ctx.windows.miss as i64 + 1500
    }

    /// Every object has been judged
    pub fn is_done(&self) -> bool {
        self.objects.iter().all(HitObject::is_finished)
    }

    /// Combo of a perfect play
    pub fn max_combo(&self) -> u32 {
        self.objects.iter().map(HitObject::max_combo).sum()
    }

    /// End time of the last object
    pub fn end_time(&self) -> i64 {
        self.objects.iter().map(HitObject::end_time).max().unwrap_or(0)
    }

    /// Advance the whole playfield to song time `now`
    pub fn update(&mut self, now: i64, input: &FrameInput, sink: &mut dyn JudgementSink) {
        self.clicks.extend(input.clicks.iter().copied());

        let pvs = self.pvs();
        let notelock = self.ctx.settings.notelock;
        let mut block_next = false;

        for i in 0..self.objects.len() {
            {
                let object = &self.objects[i];
                if object.is_finished() && now - pvs > object.end_time() {
                    continue;
                }
                if object.time() > now + pvs {
                    break;
                }
            }

            self.objects[i].update(now, input, &self.ctx, sink);

            if notelock == NotelockKind::Off {
                self.objects[i].set_blocked(false);
            } else {
                self.objects[i].set_blocked(block_next);
                block_next = self.lock_after(i, now, notelock, block_next);
            }

            let head_before = self.objects[i].is_slider_head_finished();
            let finished_before = self.objects[i].is_finished();
            if !self.clicks.is_empty() {
                self.objects[i].on_click(&mut self.clicks, input, &self.ctx, sink);
            }

            // a slider head hit this frame still lets overlapping 2B objects through
            if notelock == NotelockKind::Stable
                && !head_before
                && self.objects[i].is_slider_head_finished()
                && self.next_overlaps(i)
            {
                block_next = false;
            }

            if !finished_before && self.objects[i].is_finished() {
                block_next = false;
                match notelock {
                    NotelockKind::Neosu => self.miss_earlier(i, now, input, sink, false),
                    NotelockKind::Lazer => self.miss_earlier(i, now, input, sink, true),
                    NotelockKind::Stable | NotelockKind::Off => {}
                }
            }
        }

        if !self.clicks.is_empty() {
            log::trace!("{} unused clicks dropped at {now} ms", self.clicks.len());
            self.clicks.clear();
        }
    }

    /// Whether object `i + 1` starts inside object `i` (plus tolerance)
    fn next_overlaps(&self, i: usize) -> bool {
        match self.objects.get(i + 1) {
            Some(next) => next.time() <= self.objects[i].end_time() + NOTELOCK_2B_TOLERANCE,
            None => false,
        }
    }

    /// Blocking state for the objects after `i`
    fn lock_after(&self, i: usize, now: i64, kind: NotelockKind, block: bool) -> bool {
        let object = &self.objects[i];
        if object.is_finished() {
            return block;
        }

        match kind {
            NotelockKind::Stable => {
                let started = object.is_spinner() || object.is_slider_head_finished();
                !(started && self.next_overlaps(i))
            }
            NotelockKind::Lazer => {
                if object.is_spinner() {
                    block
                } else if object.is_slider_head_finished() {
                    false
                } else {
                    now <= object.time()
                }
            }
            NotelockKind::Neosu | NotelockKind::Off => block,
        }
    }

    /// Walk back from `i` and miss unfinished, non-overlapping objects,
    /// stopping at the first finished one
    fn miss_earlier(
        &mut self,
        i: usize,
        now: i64,
        input: &FrameInput,
        sink: &mut dyn JudgementSink,
        only_started: bool,
    ) {
        let time = self.objects[i].time();
        for m in (0..i).rev() {
            let earlier = &mut self.objects[m];
            if earlier.is_finished() {
                break;
            }
            if earlier.is_spinner() || (only_started && now <= earlier.time()) {
                continue;
            }
            if time > earlier.end_time() {
                log::debug!(
                    "{} at {} ms missed by a later hit at {now} ms",
                    earlier.kind_str(),
                    earlier.time()
                );
                earlier.miss(now, input, &self.ctx, sink);
            }
        }
    }

    /// Reset every object to the state implied by `now`, for seeking
    pub fn seek(&mut self, now: i64) {
        let now = now.max(0);
        log::info!("seek to {now} ms");
        self.clicks.clear();
        for object in &mut self.objects {
            object.reset(now);
        }
    }

    /// Where a perfect player's cursor is at `now`, interpolating between
    /// objects
    pub fn auto_cursor(&self, now: i64) -> Vec2 {
        let centre = self.ctx.playfield / 2.0;
        let Some(first) = self.objects.first() else {
            return centre;
        };
        if now <= first.time() {
            return first.start_pos();
        }

        for pair in self.objects.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if now <= current.end_time() {
                return current.auto_cursor_pos(now, &self.ctx);
            }
            if now < next.time() {
                let from = current.end_pos();
                let span = (next.time() - current.end_time()).max(1) as f32;
                let t = (now - current.end_time()) as f32 / span;
                return from.lerp(next.start_pos(), t.clamp(0.0, 1.0));
            }
        }

        match self.objects.last() {
            Some(last) if now <= last.end_time() => last.auto_cursor_pos(now, &self.ctx),
            Some(last) => last.end_pos(),
            None => centre,
        }
    }
}
