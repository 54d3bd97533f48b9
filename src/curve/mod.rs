//! Slider curve geometry
//!
//! Authored control points go through an approximator (Bezier, Catmull-Rom
//! or circular arc), then the equal-distance resampler turns the result into
//! a curve whose length matches the authored pixel length.
//!
//! Everything here is pure: no clocks, no global state. Degenerate input is
//! logged and produces an empty or minimal curve, never a panic.

pub mod bezier;
pub mod catmull;
pub mod circle;
pub mod primitives;
pub mod resample;
pub mod selector;

pub use circle::CircularArc;
pub use primitives::{ApproximatedSegment, polyline_length};
pub use resample::ResampledCurve;
pub use selector::{CurveParams, CurveType, build_curve};
