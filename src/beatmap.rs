//! Scenario description
//!
//! A scenario is an already-parsed map: difficulty, timing points and hit
//! objects in JSON. Building it derives slider durations and ticks from the
//! timing points, numbers combos and applies stacking.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::curve::CurveType;
use crate::error::{Error, Result};
use crate::rules::{self, Difficulty};
use crate::settings::{GameplaySettings, Mods};
use crate::sim::{
    Circle, GameContext, HitObject, HitObjectBase, HitSamples, Slider, SliderDesc, Spinner,
    apply_stack_offsets, calculate_stacks,
};

/// A timing point. Inherited points carry a negative beat length that
/// scales slider velocity (-100 = 1x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    pub time: i64,
    pub beat_length: f32,
    #[serde(default = "default_uninherited")]
    pub uninherited: bool,
}

fn default_uninherited() -> bool {
    true
}

fn default_repeat() -> u32 {
    1
}

/// Timing in effect at some song time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingInfo {
    /// Beat length with the velocity multiplier applied (ms)
    pub beat_length: f32,
    /// Beat length of the governing uninherited point (ms)
    pub beat_length_base: f32,
    pub is_nan: bool,
}

/// Look up the timing at `time`.
///
/// Objects before the first point use the first point. Returns `None` only
/// when there are no timing points at all.
pub fn timing_at(points: &[TimingPoint], time: i64) -> Option<TimingInfo> {
    if points.is_empty() {
        return None;
    }

    let mut point = 0;
    let mut sample_point = 0;
    for (i, p) in points.iter().enumerate() {
        if p.time <= time {
            if p.uninherited {
                point = i;
            } else {
                sample_point = i;
            }
        }
    }

    let mut multiplier = 1.0;
    if sample_point > point && points[sample_point].beat_length < 0.0 {
        multiplier = (-points[sample_point].beat_length).clamp(10.0, 1000.0) / 100.0;
    }

    let base = points[point].beat_length;
    Some(TimingInfo {
        beat_length: base * multiplier,
        beat_length_base: base,
        is_nan: base.is_nan() || points[sample_point].beat_length.is_nan(),
    })
}

/// Slider duration and tick layout
#[derive(Debug, Clone, PartialEq)]
pub struct SliderTiming {
    pub slider_time_without_repeats: f32,
    pub slider_time: f32,
    /// Tick positions along one traversal, 0..1
    pub tick_percents: Vec<f32>,
}

/// Derive duration and ticks for a slider of `pixel_length` under `timing`
pub fn slider_timing(
    pixel_length: f32,
    repeat: u32,
    timing: &TimingInfo,
    slider_multiplier: f32,
    slider_tick_rate: f32,
    version: u32,
    max_ticks: usize,
) -> SliderTiming {
    let tick_distance = 100.0 * slider_multiplier / slider_tick_rate;

    let duration = timing.beat_length * (pixel_length / slider_multiplier) / 100.0;
    let slider_time_without_repeats = if duration >= 1.0 { duration } else { 1.0 };

    let velocity = if timing.beat_length > 0.0 {
        tick_distance * slider_tick_rate * (1000.0 / timing.beat_length)
    } else {
        tick_distance * slider_tick_rate
    };
    let min_distance_from_end = 0.01 * velocity;

    // old files don't scale tick spacing with slider velocity
    let tick_pixel_length = if version < 8 {
        tick_distance
    } else {
        let base = if timing.beat_length_base == 0.0 {
            1.0
        } else {
            timing.beat_length_base
        };
        tick_distance / (timing.beat_length / base)
    };
    let tick_percent = tick_pixel_length / if pixel_length == 0.0 { 1.0 } else { pixel_length };
    let tick_count = ((pixel_length / tick_pixel_length).ceil() as i64 - 1).min(max_ticks as i64);

    let mut tick_percents = Vec::new();
    if tick_count > 0 && !timing.is_nan && !pixel_length.is_nan() && !tick_pixel_length.is_nan() {
        let mut distance_to_end = pixel_length;
        let mut t = tick_percent;
        for _ in 0..tick_count {
            distance_to_end -= tick_pixel_length;
            if distance_to_end <= min_distance_from_end {
                break;
            }
            tick_percents.push(t);
            t += tick_percent;
        }
    }

    SliderTiming {
        slider_time_without_repeats,
        slider_time: slider_time_without_repeats * repeat as f32,
        tick_percents,
    }
}

/// One authored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectDesc {
    Circle {
        time: i64,
        pos: Vec2,
        #[serde(default)]
        new_combo: bool,
        /// Combo colours to skip on a new combo
        #[serde(default)]
        combo_skip: u32,
        #[serde(default)]
        samples: HitSamples,
    },
    Slider {
        time: i64,
        #[serde(default)]
        curve_type: CurveType,
        points: Vec<Vec2>,
        #[serde(default = "default_repeat")]
        repeat: u32,
        pixel_length: f32,
        #[serde(default)]
        new_combo: bool,
        #[serde(default)]
        combo_skip: u32,
        #[serde(default)]
        samples: HitSamples,
    },
    Spinner {
        time: i64,
        end_time: i64,
        #[serde(default)]
        new_combo: bool,
        #[serde(default)]
        combo_skip: u32,
        #[serde(default)]
        samples: HitSamples,
    },
}

impl ObjectDesc {
    pub fn time(&self) -> i64 {
        match self {
            ObjectDesc::Circle { time, .. }
            | ObjectDesc::Slider { time, .. }
            | ObjectDesc::Spinner { time, .. } => *time,
        }
    }

    fn combo(&self) -> (bool, u32) {
        match self {
            ObjectDesc::Circle { new_combo, combo_skip, .. }
            | ObjectDesc::Slider { new_combo, combo_skip, .. }
            | ObjectDesc::Spinner { new_combo, combo_skip, .. } => (*new_combo, *combo_skip),
        }
    }

    fn samples(&self) -> HitSamples {
        match self {
            ObjectDesc::Circle { samples, .. }
            | ObjectDesc::Slider { samples, .. }
            | ObjectDesc::Spinner { samples, .. } => *samples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub difficulty: Difficulty,
    pub slider_multiplier: f32,
    pub slider_tick_rate: f32,
    /// File format version (stacking algorithm, tick spacing)
    pub version: u32,
    pub stack_leniency: f32,
    pub timing_points: Vec<TimingPoint>,
    pub objects: Vec<ObjectDesc>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
            version: 14,
            stack_leniency: 0.7,
            timing_points: Vec::new(),
            objects: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let scenario = Self::from_json(&json)?;
        log::info!(
            "Loaded scenario from {} ({} objects, {} timing points)",
            path.display(),
            scenario.objects.len(),
            scenario.timing_points.len()
        );
        Ok(scenario)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Scenario saved to {}", path.display());
        Ok(())
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.slider_multiplier > 0.0) || !(self.slider_tick_rate > 0.0) {
            return Err(Error::InvalidScenario(format!(
                "slider multiplier {} / tick rate {} must be positive",
                self.slider_multiplier, self.slider_tick_rate
            )));
        }

        for object in &self.objects {
            match object {
                ObjectDesc::Slider {
                    time,
                    repeat,
                    pixel_length,
                    ..
                } => {
                    if *repeat == 0 {
                        return Err(Error::InvalidScenario(format!("slider at {time} ms has no traversals")));
                    }
                    if !pixel_length.is_finite() || *pixel_length < 0.0 {
                        return Err(Error::InvalidScenario(format!(
                            "slider at {time} ms has pixel length {pixel_length}"
                        )));
                    }
                }
                ObjectDesc::Spinner { time, end_time, .. } if end_time < time => {
                    return Err(Error::InvalidScenario(format!(
                        "spinner at {time} ms ends before it starts ({end_time} ms)"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Context for playing this scenario
    pub fn context(&self, mods: Mods, settings: GameplaySettings) -> GameContext {
        GameContext::new(self.difficulty, mods, settings)
    }

    /// Build the playable objects, sorted by time, numbered and stacked
    pub fn build(&self, ctx: &GameContext) -> Result<Vec<HitObject>> {
        self.validate()?;

        let params = ctx.settings.curve_params();
        let mut descs: Vec<&ObjectDesc> = self.objects.iter().collect();
        descs.sort_by_key(|d| d.time());

        let mut objects = Vec::with_capacity(descs.len());
        let mut combo_number = 1;
        let mut colour_counter = 0;
        let mut colour_offset = 0;
        let mut non_spinners = 0;

        for (i, desc) in descs.iter().enumerate() {
            let is_spinner = matches!(desc, ObjectDesc::Spinner { .. });
            if !is_spinner {
                non_spinners += 1;
            }

            let (new_combo, combo_skip) = desc.combo();
            if new_combo || i == 0 {
                combo_number = 1;
                // spinners and the first object don't advance the colour
                if !is_spinner && non_spinners > 1 {
                    colour_counter += 1;
                }
                colour_offset += combo_skip;
            }

            let mut base = HitObjectBase::new(desc.time(), 0);
            base.combo_number = combo_number;
            base.colour_index = colour_counter + colour_offset;
            base.samples = desc.samples();
            combo_number += 1;

            let object: HitObject = match desc {
                ObjectDesc::Circle { pos, .. } => Circle::new(*pos, base).into(),
                ObjectDesc::Slider {
                    time,
                    curve_type,
                    points,
                    repeat,
                    pixel_length,
                    ..
                } => {
                    let timing = timing_at(&self.timing_points, *time).ok_or(Error::NoTimingPoint(*time))?;
                    let derived = slider_timing(
                        *pixel_length,
                        *repeat,
                        &timing,
                        self.slider_multiplier,
                        self.slider_tick_rate,
                        self.version,
                        ctx.settings.slider_max_ticks,
                    );
                    let desc = SliderDesc {
                        curve_type: *curve_type,
                        points: points.clone(),
                        repeat: *repeat,
                        pixel_length: *pixel_length,
                        slider_time: derived.slider_time,
                        slider_time_without_repeats: derived.slider_time_without_repeats,
                        tick_percents: derived.tick_percents,
                    };
                    Slider::new(desc, base, &params).into()
                }
                ObjectDesc::Spinner { time, end_time, .. } => {
                    base.duration = end_time - time;
                    Spinner::new(ctx.playfield / 2.0, base).into()
                }
            };
            objects.push(object);
        }

        let combo_starts: Vec<bool> = objects.iter().map(|o| o.base().combo_number == 1).collect();
        for (i, object) in objects.iter_mut().enumerate() {
            let next_starts_combo = combo_starts.get(i + 1).copied().unwrap_or(true);
            object.base_mut().end_of_combo = next_starts_combo;
        }

        calculate_stacks(
            &mut objects,
            rules::approach_time(ctx.difficulty.ar),
            self.stack_leniency,
            self.version,
        );
        apply_stack_offsets(&mut objects, ctx.stack_offset(), ctx.mods.hard_rock);

        log::debug!("built {} objects", objects.len());
        Ok(objects)
    }
}
