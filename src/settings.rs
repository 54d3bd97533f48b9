//! Gameplay settings and mods
//!
//! Settings hold the tunable constants of the simulation and are persisted
//! as JSON. Mods are the per-play modifiers selected by the player.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::curve::CurveParams;
use crate::error::Result;

/// How earlier unfinished objects interact with clicks on later ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotelockKind {
    /// Nothing is ever blocked
    Off,
    /// Hitting an object auto-misses earlier unfinished ones
    #[default]
    Neosu,
    /// An unfinished object blocks every later one
    Stable,
    /// Objects block until their start time only
    Lazer,
}

impl NotelockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotelockKind::Off => "off",
            NotelockKind::Neosu => "neosu",
            NotelockKind::Stable => "stable",
            NotelockKind::Lazer => "lazer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Some(NotelockKind::Off),
            "neosu" | "mcosu" => Some(NotelockKind::Neosu),
            "stable" => Some(NotelockKind::Stable),
            "lazer" => Some(NotelockKind::Lazer),
            _ => None,
        }
    }
}

/// Hidden mod fade window, as fractions of the approach time before the hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HiddenFade {
    pub fade_in_start: f32,
    pub fade_in_end: f32,
    pub fade_out_start: f32,
    pub fade_out_end: f32,
}

impl Default for HiddenFade {
    fn default() -> Self {
        Self {
            fade_in_start: 1.0,
            fade_in_end: 0.6,
            fade_out_start: 0.6,
            fade_out_end: 0.3,
        }
    }
}

/// Gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    // === Curves ===
    /// Distance between resampled curve points
    pub curve_point_separation: f32,
    pub curve_max_points: usize,
    /// Arc sample coordinates are clamped to +-this
    pub curve_sanity_range: f32,

    // === Sliders ===
    /// The end is judged this many ms before the slider actually ends
    pub slider_end_inside_check_offset: i64,
    /// A missed slider end resets combo
    pub slider_end_miss_breaks_combo: bool,
    pub slider_max_ticks: usize,
    /// Losing the follow circle breaks the slider immediately
    pub strict_tracking: bool,

    // === Timing ===
    /// Relax hits fire this many ms relative to the object time
    pub relax_offset: i64,
    /// Hit object body fade-in (ms)
    pub fade_in_time: f32,
    /// Approach time multiplier under millhioref
    pub millhioref_multiplier: f32,

    // === Visuals ===
    pub approach_scale_multiplier: f32,
    pub hidden: HiddenFade,
    /// Dim objects that cannot be hit yet
    pub hittable_dim: bool,
    pub hittable_dim_start: f32,
    /// Length of the un-dim ramp (ms)
    pub hittable_dim_duration: i64,

    pub notelock: NotelockKind,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            curve_point_separation: CURVE_POINT_SEPARATION,
            curve_max_points: CURVE_MAX_POINTS,
            curve_sanity_range: CURVE_MAX_LENGTH,

            slider_end_inside_check_offset: SLIDER_END_INSIDE_CHECK_OFFSET,
            slider_end_miss_breaks_combo: true,
            slider_max_ticks: SLIDER_MAX_TICKS,
            strict_tracking: false,

            relax_offset: RELAX_OFFSET,
            fade_in_time: FADE_IN_TIME,
            millhioref_multiplier: 2.0,

            approach_scale_multiplier: APPROACH_SCALE_MULTIPLIER,
            hidden: HiddenFade::default(),
            hittable_dim: true,
            hittable_dim_start: 0.7647,
            hittable_dim_duration: 100,

            notelock: NotelockKind::default(),
        }
    }
}

impl GameplaySettings {
    /// Curve resampling parameters
    pub fn curve_params(&self) -> CurveParams {
        CurveParams {
            point_separation: self.curve_point_separation,
            max_points: self.curve_max_points,
            sanity_range: self.curve_sanity_range,
        }
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Using default settings ({}: {e})",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// Player-selected modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mods {
    /// Playback speed (1.0 = normal, 1.5 = DT, 0.75 = HT)
    pub speed: f32,

    pub autoplay: bool,
    pub relax: bool,
    pub autopilot: bool,
    pub spun_out: bool,

    pub hidden: bool,
    pub hard_rock: bool,
    pub easy: bool,

    pub score_v2: bool,

    /// Late hits are misses
    pub half_window: bool,
    /// ...except late hits inside the perfect window
    pub half_window_allow_300s: bool,
    pub no_100s: bool,
    pub no_50s: bool,
    /// No 100s on circles, sliders or spinners
    pub ming3012: bool,
    /// Doubled approach time
    pub millhioref: bool,
}

impl Default for Mods {
    fn default() -> Self {
        Self {
            speed: 1.0,
            autoplay: false,
            relax: false,
            autopilot: false,
            spun_out: false,
            hidden: false,
            hard_rock: false,
            easy: false,
            score_v2: false,
            half_window: false,
            half_window_allow_300s: false,
            no_100s: false,
            no_50s: false,
            ming3012: false,
            millhioref: false,
        }
    }
}

impl Mods {
    /// Enable a mod by name or acronym. Returns false for unknown names.
    pub fn enable(&mut self, name: &str) -> bool {
        match name.trim().to_lowercase().as_str() {
            "autoplay" | "auto" | "at" => self.autoplay = true,
            "relax" | "rx" => self.relax = true,
            "autopilot" | "ap" => self.autopilot = true,
            "spunout" | "spun_out" | "so" => self.spun_out = true,
            "hidden" | "hd" => self.hidden = true,
            "hardrock" | "hard_rock" | "hr" => self.hard_rock = true,
            "easy" | "ez" => self.easy = true,
            "scorev2" | "score_v2" | "v2" => self.score_v2 = true,
            "halfwindow" | "half_window" => self.half_window = true,
            "halfwindow300" | "half_window_allow_300s" => {
                self.half_window = true;
                self.half_window_allow_300s = true;
            }
            "no100s" | "no_100s" => self.no_100s = true,
            "no50s" | "no_50s" => self.no_50s = true,
            "ming3012" => self.ming3012 = true,
            "millhioref" => self.millhioref = true,
            "doubletime" | "dt" => self.speed = 1.5,
            "halftime" | "ht" => self.speed = 0.75,
            _ => return false,
        }
        true
    }

    /// Parse a comma separated mod list. Returns the first unknown name on
    /// failure.
    pub fn parse_list(list: &str) -> std::result::Result<Self, String> {
        let mut mods = Self::default();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            if !mods.enable(name) {
                return Err(name.trim().to_string());
            }
        }
        Ok(mods)
    }

    /// The bot drives the cursor (autoplay or autopilot)
    #[inline]
    pub fn cursor_is_automated(&self) -> bool {
        self.autoplay || self.autopilot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hitsim-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let s = GameplaySettings::default();
        assert_eq!(s.curve_point_separation, 2.5);
        assert_eq!(s.curve_max_points, 9999);
        assert_eq!(s.slider_end_inside_check_offset, 36);
        assert_eq!(s.relax_offset, -12);
        assert_eq!(s.notelock, NotelockKind::Neosu);
        assert!(!s.strict_tracking);
        assert_eq!(s.hidden.fade_in_end, 0.6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: GameplaySettings =
            serde_json::from_str(r#"{ "notelock": "stable", "strict_tracking": true }"#).unwrap();
        assert_eq!(s.notelock, NotelockKind::Stable);
        assert!(s.strict_tracking);
        assert_eq!(s.slider_max_ticks, 2048);
    }

    #[test]
    fn test_save_load_file() {
        let path = temp_path("settings.json");
        let mut s = GameplaySettings::default();
        s.notelock = NotelockKind::Lazer;
        s.curve_point_separation = 5.0;
        s.save(&path).unwrap();

        let loaded = GameplaySettings::load(&path).unwrap();
        assert_eq!(loaded, s);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let s = GameplaySettings::load_or_default(temp_path("does-not-exist.json"));
        assert_eq!(s, GameplaySettings::default());
    }

    #[test]
    fn test_load_bad_json_is_error() {
        let path = temp_path("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            GameplaySettings::load(&path),
            Err(crate::Error::Json(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_notelock_from_str() {
        assert_eq!(NotelockKind::from_str("Stable"), Some(NotelockKind::Stable));
        assert_eq!(NotelockKind::from_str("off"), Some(NotelockKind::Off));
        assert_eq!(NotelockKind::from_str("bogus"), None);
        assert_eq!(NotelockKind::Lazer.as_str(), "lazer");
    }

    #[test]
    fn test_parse_mod_list() {
        let mods = Mods::parse_list("HD,hr, dt").unwrap();
        assert!(mods.hidden && mods.hard_rock);
        assert_eq!(mods.speed, 1.5);
        assert!(!mods.autoplay);

        assert_eq!(Mods::parse_list("hd,flashlight"), Err("flashlight".to_string()));
        assert_eq!(Mods::parse_list("").unwrap(), Mods::default());
    }
}
