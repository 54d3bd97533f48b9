//! Per-frame input snapshot

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One of the two gameplay keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Key {
    #[default]
    K1,
    K2,
}

/// A key press waiting to be matched against an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Click {
    /// Cursor position at the moment of the press (osu!pixels)
    pub pos: Vec2,
    /// Song time of the press (ms)
    pub time: i64,
}

/// Input commands for a single frame (deterministic)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Cursor position (osu!pixels)
    pub cursor: Vec2,
    pub key1: bool,
    pub key2: bool,
    /// The key that went down most recently
    pub last_pressed: Key,
    /// Length of this frame (ms of song time)
    pub frame_ms: f32,
    /// Presses since the previous frame, oldest first
    pub clicks: Vec<Click>,
}

impl FrameInput {
    pub fn new(cursor: Vec2, frame_ms: f32) -> Self {
        Self {
            cursor,
            frame_ms,
            ..Self::default()
        }
    }

    /// Any gameplay key is down
    #[inline]
    pub fn is_held(&self) -> bool {
        self.key1 || self.key2
    }

    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        match key {
            Key::K1 => self.key1,
            Key::K2 => self.key2,
        }
    }

    /// Press `key` at `time` with the cursor where it is now
    pub fn press(&mut self, key: Key, time: i64) {
        match key {
            Key::K1 => self.key1 = true,
            Key::K2 => self.key2 = true,
        }
        self.last_pressed = key;
        self.clicks.push(Click {
            pos: self.cursor,
            time,
        });
    }

    pub fn release(&mut self, key: Key) {
        match key {
            Key::K1 => self.key1 = false,
            Key::K2 => self.key2 = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut input = FrameInput::new(Vec2::new(10.0, 20.0), 16.0);
        input.press(Key::K1, 100);
        input.press(Key::K2, 105);
        assert!(input.is_held());
        assert_eq!(input.last_pressed, Key::K2);
        assert_eq!(input.clicks.len(), 2);
        assert_eq!(input.clicks[0].pos, Vec2::new(10.0, 20.0));

        input.release(Key::K1);
        input.release(Key::K2);
        assert!(!input.is_held());
        assert!(!input.is_down(Key::K1));
    }
}
