//! Judgement events and the sink that receives them

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::rules::health_increase;

/// Result tier of a single judgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitResult {
    /// 300
    Perfect,
    /// 100
    Good,
    /// 50
    Meh,
    Miss,
    /// Health drain for a dropped slider part, no accuracy impact
    MissSliderBreak,
    SliderRepeat,
    SliderTick,
    SpinnerSpin,
    SpinnerBonus,
}

impl HitResult {
    /// Base score value
    pub fn score(&self) -> u32 {
        match self {
            HitResult::Perfect => 300,
            HitResult::Good => 100,
            HitResult::Meh => 50,
            HitResult::SliderRepeat => 30,
            HitResult::SliderTick => 10,
            HitResult::SpinnerSpin => 100,
            HitResult::SpinnerBonus => 1100,
            HitResult::Miss | HitResult::MissSliderBreak => 0,
        }
    }

    /// Anything that keeps the player alive
    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, HitResult::Miss | HitResult::MissSliderBreak)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HitResult::Perfect => "300",
            HitResult::Good => "100",
            HitResult::Meh => "50",
            HitResult::Miss => "miss",
            HitResult::MissSliderBreak => "sliderbreak",
            HitResult::SliderRepeat => "repeat",
            HitResult::SliderTick => "tick",
            HitResult::SpinnerSpin => "spin",
            HitResult::SpinnerBonus => "bonus",
        }
    }
}

/// How a judgement feeds the score, combo and health bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgementFlags {
    pub counts_for_accuracy: bool,
    pub counts_for_combo: bool,
    pub affects_health: bool,
    pub shown_on_error_bar: bool,
}

impl JudgementFlags {
    /// A regular hit circle / slider end / spinner judgement
    pub const OBJECT: Self = Self {
        counts_for_accuracy: true,
        counts_for_combo: true,
        affects_health: true,
        shown_on_error_bar: true,
    };

    /// Combo and health only (slider repeats and ticks)
    pub const COMBO_ONLY: Self = Self {
        counts_for_accuracy: false,
        counts_for_combo: true,
        affects_health: true,
        shown_on_error_bar: false,
    };

    /// Health only (slider break drains, spinner spins)
    pub const HEALTH_ONLY: Self = Self {
        counts_for_accuracy: false,
        counts_for_combo: false,
        affects_health: true,
        shown_on_error_bar: false,
    };
}

/// One judgement event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub result: HitResult,
    /// Signed hit error in ms (negative = early)
    pub delta: i64,
    /// Raw position of the judged object part
    pub pos: Vec2,
    pub end_of_combo: bool,
    pub flags: JudgementFlags,
    /// Normalised distance of the click from the object centre
    pub target_delta: Option<f32>,
    /// Direction of the click from the object centre (degrees)
    pub target_angle: Option<f32>,
}

impl Judgement {
    pub fn new(result: HitResult, delta: i64, pos: Vec2, flags: JudgementFlags) -> Self {
        Self {
            result,
            delta,
            pos,
            end_of_combo: false,
            flags,
            target_delta: None,
            target_angle: None,
        }
    }

    pub fn end_of_combo(mut self, end_of_combo: bool) -> Self {
        self.end_of_combo = end_of_combo;
        self
    }

    pub fn with_target(mut self, target_delta: f32, target_angle: f32) -> Self {
        self.target_delta = Some(target_delta);
        self.target_angle = Some(target_angle);
        self
    }
}

/// Receiver of everything the simulation decides
pub trait JudgementSink {
    fn on_judgement(&mut self, judgement: &Judgement);
    /// Combo reset without a judgement
    fn on_slider_break(&mut self);
    fn on_score_bonus(&mut self, points: u32);
}

/// Running score, combo, accuracy and health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCounter {
    /// HP difficulty, scales health gains and drains
    pub hp: f32,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfects: u32,
    pub goods: u32,
    pub mehs: u32,
    pub misses: u32,
    pub slider_breaks: u32,
    /// 0..=1
    pub health: f64,
    /// Signed hit errors of everything shown on the error bar
    pub hit_errors: Vec<i64>,
}

impl ScoreCounter {
    pub fn new(hp: f32) -> Self {
        Self {
            hp,
            score: 0,
            combo: 0,
            max_combo: 0,
            perfects: 0,
            goods: 0,
            mehs: 0,
            misses: 0,
            slider_breaks: 0,
            health: 1.0,
            hit_errors: Vec::new(),
        }
    }

    /// Accuracy in [0, 1] (1 when nothing has been judged yet)
    pub fn accuracy(&self) -> f64 {
        let total = self.perfects + self.goods + self.mehs + self.misses;
        if total == 0 {
            return 1.0;
        }
        let points = self.perfects as f64 * 300.0 + self.goods as f64 * 100.0 + self.mehs as f64 * 50.0;
        points / (total as f64 * 300.0)
    }

    /// Mean hit error (ms) of everything shown on the error bar
    pub fn mean_hit_error(&self) -> Option<f64> {
        if self.hit_errors.is_empty() {
            return None;
        }
        Some(self.hit_errors.iter().sum::<i64>() as f64 / self.hit_errors.len() as f64)
    }

    fn break_combo(&mut self) {
        self.combo = 0;
    }
}

impl JudgementSink for ScoreCounter {
    fn on_judgement(&mut self, j: &Judgement) {
        let flags = j.flags;

        if flags.counts_for_accuracy {
            match j.result {
                HitResult::Perfect => self.perfects += 1,
                HitResult::Good => self.goods += 1,
                HitResult::Meh => self.mehs += 1,
                HitResult::Miss => self.misses += 1,
                _ => {}
            }
        }

        // a miss always drops combo, even when it doesn't count towards it
        if j.result == HitResult::Miss {
            self.break_combo();
        } else if flags.counts_for_combo {
            if j.result.is_hit() {
                self.combo += 1;
                self.max_combo = self.max_combo.max(self.combo);
            } else {
                self.break_combo();
            }
        }

        if flags.affects_health {
            self.health = (self.health + health_increase(j.result, self.hp)).clamp(0.0, 1.0);
        }

        if flags.shown_on_error_bar && j.result.is_hit() {
            self.hit_errors.push(j.delta);
        }

        // part points arrive through on_score_bonus
        if flags.counts_for_accuracy {
            let base = j.result.score() as u64;
            let combo_multiplier = self.combo.saturating_sub(1) as u64;
            self.score += base + base * combo_multiplier / 25;
        }
    }

    fn on_slider_break(&mut self) {
        self.slider_breaks += 1;
        self.break_combo();
    }

    fn on_score_bonus(&mut self, points: u32) {
        self.score += points as u64;
    }
}

/// Sink event, as recorded by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Judgement(Judgement),
    SliderBreak,
    ScoreBonus(u32),
}

/// Sink that remembers every event in order
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn judgements(&self) -> impl Iterator<Item = &Judgement> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Judgement(j) => Some(j),
            _ => None,
        })
    }

    /// Results in emission order
    pub fn results(&self) -> Vec<HitResult> {
        self.judgements().map(|j| j.result).collect()
    }

    pub fn slider_breaks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::SliderBreak))
            .count()
    }

    pub fn bonus_points(&self) -> u32 {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::ScoreBonus(p) => Some(*p),
                _ => None,
            })
            .sum()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl JudgementSink for RecordingSink {
    fn on_judgement(&mut self, judgement: &Judgement) {
        self.events.push(SinkEvent::Judgement(judgement.clone()));
    }

    fn on_slider_break(&mut self) {
        self.events.push(SinkEvent::SliderBreak);
    }

    fn on_score_bonus(&mut self, points: u32) {
        self.events.push(SinkEvent::ScoreBonus(points));
    }
}

/// Forwards every event to two sinks
pub struct Tee<'a, A: JudgementSink, B: JudgementSink>(pub &'a mut A, pub &'a mut B);

impl<A: JudgementSink, B: JudgementSink> JudgementSink for Tee<'_, A, B> {
    fn on_judgement(&mut self, judgement: &Judgement) {
        self.0.on_judgement(judgement);
        self.1.on_judgement(judgement);
    }

    fn on_slider_break(&mut self) {
        self.0.on_slider_break();
        self.1.on_slider_break();
    }

    fn on_score_bonus(&mut self, points: u32) {
        self.0.on_score_bonus(points);
        self.1.on_score_bonus(points);
    }
}
