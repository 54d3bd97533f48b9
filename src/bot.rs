//! Scripted player for headless runs
//!
//! Presses one key per object at its start time (plus seeded jitter),
//! alternating keys, and holds through sliders and spinners. The cursor
//! follows the playfield's autoplay path.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{Click, FrameInput, HitObject, Key, Playfield};

/// How long a tap is held (ms)
const TAP_HOLD: i64 = 40;

/// One scheduled key press
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Press {
    pub key: Key,
    pub time: i64,
    pub release: i64,
    pub pos: Vec2,
}

#[derive(Debug, Clone)]
pub struct Bot {
    presses: Vec<Press>,
    last_frame: Option<i64>,
}

impl Bot {
    /// Schedule presses for `objects`, offsetting each by up to `jitter` ms
    pub fn new(objects: &[HitObject], jitter: i64, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let jitter = jitter.max(0);

        let mut presses: Vec<Press> = objects
            .iter()
            .enumerate()
            .map(|(i, object)| {
                let offset = if jitter > 0 { rng.random_range(-jitter..=jitter) } else { 0 };
                let time = object.time() + offset;
                let release = if object.duration() > 0 {
                    object.end_time() + TAP_HOLD
                } else {
                    time + TAP_HOLD
                };
                Press {
                    key: if i % 2 == 0 { Key::K1 } else { Key::K2 },
                    time,
                    release,
                    pos: object.start_pos(),
                }
            })
            .collect();
        presses.sort_by_key(|p| p.time);

        log::debug!("bot: {} presses, jitter {jitter} ms, seed {seed}", presses.len());
        Self {
            presses,
            last_frame: None,
        }
    }

    pub fn presses(&self) -> &[Press] {
        &self.presses
    }

    /// Input for the frame ending at `now`
    pub fn frame(&mut self, now: i64, frame_ms: f32, field: &Playfield) -> FrameInput {
        let mut input = FrameInput::new(field.auto_cursor(now), frame_ms);
        let since = self.last_frame.unwrap_or(i64::MIN);

        for press in &self.presses {
            if press.time > since && press.time <= now {
                input.last_pressed = press.key;
                input.clicks.push(Click {
                    pos: press.pos,
                    time: press.time,
                });
            }
            if press.time <= now && now < press.release {
                match press.key {
                    Key::K1 => input.key1 = true,
                    Key::K2 => input.key2 = true,
                }
            }
        }

        self.last_frame = Some(now);
        input
    }

    /// Forget frame history, for seeking
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Difficulty;
    use crate::settings::{GameplaySettings, Mods};
    use crate::sim::{Circle, GameContext, HitObjectBase, HitResult, RecordingSink};

    fn field() -> Playfield {
        let objects: Vec<HitObject> = (0..6)
            .map(|i| {
                let pos = Vec2::new(100.0 + 50.0 * i as f32, 200.0);
                Circle::new(pos, HitObjectBase::new(1000 + 300 * i, 0)).into()
            })
            .collect();
        let ctx = GameContext::new(Difficulty::default(), Mods::default(), GameplaySettings::default());
        Playfield::new(objects, ctx)
    }

    fn play(jitter: i64, seed: u64) -> RecordingSink {
        let mut field = field();
        let mut bot = Bot::new(field.objects(), jitter, seed);
        let mut sink = RecordingSink::new();
        for now in (0..=3000).step_by(8) {
            let input = bot.frame(now, 8.0, &field);
            field.update(now, &input, &mut sink);
        }
        sink
    }

    #[test]
    fn test_alternates_keys() {
        let field = field();
        let bot = Bot::new(field.objects(), 0, 1);
        let keys: Vec<Key> = bot.presses().iter().map(|p| p.key).collect();
        assert_eq!(keys[..3], [Key::K1, Key::K2, Key::K1]);
        assert_eq!(bot.presses()[0].release, 1000 + TAP_HOLD);
    }

    #[test]
    fn test_exact_bot_hits_everything() {
        let sink = play(0, 7);
        assert_eq!(sink.results(), vec![HitResult::Perfect; 6]);
    }

    #[test]
    fn test_jitter_is_seeded() {
        assert_eq!(play(40, 3).events, play(40, 3).events);

        let field = field();
        let a = Bot::new(field.objects(), 40, 3);
        let b = Bot::new(field.objects(), 40, 4);
        assert_ne!(a.presses(), b.presses());
        assert!(a.presses().iter().zip(field.objects()).all(|(p, o)| (p.time - o.time()).abs() <= 40));
    }

    #[test]
    fn test_each_press_clicks_once() {
        let field = field();
        let mut bot = Bot::new(field.objects(), 0, 1);
        let clicks: usize = (0..=3000)
            .step_by(8)
            .map(|now| bot.frame(now, 8.0, &field).clicks.len())
            .sum();
        assert_eq!(clicks, 6);
    }
}
