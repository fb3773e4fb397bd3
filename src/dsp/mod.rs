//! DSP Building Blocks
//!
//! The pieces the block processor sequences: peaking EQ biquad, gain and
//! soft saturation, peak metering and denormal suppression. Everything here
//! is allocation-free once constructed and safe to call from the audio
//! callback.

pub mod biquad;
pub mod denormal;
pub mod meter;
pub mod saturation;

pub use biquad::{
    compute_coefficients, db_to_linear, BiquadCoeffs, BiquadState, ChannelFilters,
    CoefficientCache, EQ_CENTER_HZ, EQ_Q,
};
pub use denormal::ScopedNoDenormals;
pub use meter::{clamp_unit, linear_to_db, update_peak, LevelMeter};
pub use saturation::{apply_gain_and_saturation, soft_saturate, SATURATION_THRESHOLD};
