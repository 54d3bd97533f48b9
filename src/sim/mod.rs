//! Deterministic simulation module
//!
//! All judgement logic lives here. This module must be pure and deterministic:
//! - Song time in, judgements out (no wall clock)
//! - Objects processed in start-time order
//! - Every decision goes through a `JudgementSink`
//! - No rendering or audio dependencies

pub mod circle;
pub mod context;
pub mod fade;
pub mod input;
pub mod judgement;
pub mod object;
pub mod playfield;
pub mod slider;
pub mod spinner;
pub mod stacking;

pub use circle::{Circle, CircleState};
pub use context::GameContext;
pub use fade::{FadeState, update_fade};
pub use input::{Click, FrameInput, Key};
pub use judgement::{
    HitResult, Judgement, JudgementFlags, JudgementSink, RecordingSink, ScoreCounter, SinkEvent, Tee,
};
pub use object::{HitObject, HitObjectBase, HitSamples};
pub use playfield::Playfield;
pub use slider::{Slider, SliderClick, SliderClickKind, SliderDesc, SliderTick};
pub use spinner::Spinner;
pub use stacking::{apply_stack_offsets, calculate_stacks};
