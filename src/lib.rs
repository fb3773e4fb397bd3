//! GainKnob - Gain / Saturation Effect with EQ Boost
//!
//! A small real-time audio effect: a peaking EQ boost at 400 Hz followed by
//! a gain stage with soft saturation, plus a stereo peak meter and a
//! decimated waveform feed for an editor.
//!
//! # Architecture
//!
//! Two execution contexts share state without locks:
//! - Audio callback: [`engine::GainKnobProcessor`] reads the
//!   [`params::ParameterStore`] and writes the [`dsp::LevelMeter`] and
//!   [`visual::WaveformRing`] sinks once per block.
//! - Editor / control surface: sets parameters and polls the sinks at
//!   [`visual::REFRESH_HZ`].

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod visual;

pub use engine::{AudioBuffer, GainKnobProcessor, ProcessorConfig, ProcessorOutputs, ProcessorState};
pub use error::{GainKnobError, Result};
pub use params::{ParameterId, ParameterStore, PluginState};

/// Name reported to hosts
pub const PLUGIN_NAME: &str = "GainKnob";

/// The effect has no tail once input stops
pub const TAIL_LENGTH_SECS: f64 = 0.0;

/// Number of factory programs exposed to the host
pub const NUM_PROGRAMS: usize = 1;

/// The effect neither consumes nor produces MIDI
pub const ACCEPTS_MIDI: bool = false;
pub const PRODUCES_MIDI: bool = false;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_metadata() {
        assert_eq!(PLUGIN_NAME, "GainKnob");
        assert_eq!(TAIL_LENGTH_SECS, 0.0);
        assert_eq!(NUM_PROGRAMS, 1);
        assert!(!ACCEPTS_MIDI && !PRODUCES_MIDI);
    }
}
