//! Block Processing Orchestrator
//!
//! Host-facing lifecycle of the effect:
//!
//! ```text
//! Uninitialized --prepare--> Prepared --process--> Running --release--> Released
//!                               ^                                          |
//!                               +-------------------prepare----------------+
//! ```
//!
//! Each block runs, in order: clear output-only channels, read parameters,
//! refresh EQ coefficients if the boost changed, filter then gain/saturate
//! each input channel, publish peak levels, push one decimated sample to the
//! waveform ring.
//!
//! `process` is real-time safe: no allocation, no locks, no logging, no
//! panics. Anything unexpected degrades to leaving the buffer untouched.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::dsp::biquad::{BiquadCoeffs, ChannelFilters, CoefficientCache};
use crate::dsp::denormal::ScopedNoDenormals;
use crate::dsp::meter::{peak_of, update_peak, LevelMeter};
use crate::dsp::saturation::{apply_gain_and_saturation, apply_gain_and_saturation_iter};
use crate::engine::buffer::AudioBuffer;
use crate::error::{GainKnobError, Result};
use crate::params::ParameterStore;
use crate::visual::ring::WaveformRing;

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle state of the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessorState {
    /// Constructed, never prepared
    #[default]
    Uninitialized,
    /// Filters allocated and coefficients computed, no block processed yet
    Prepared,
    /// At least one block processed since the last prepare
    Running,
    /// Stream stopped; must be prepared again before processing
    Released,
}

impl ProcessorState {
    /// Whether `process` does any work in this state
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessorState::Prepared | ProcessorState::Running)
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorState::Uninitialized => write!(f, "Uninitialized"),
            ProcessorState::Prepared => write!(f, "Prepared"),
            ProcessorState::Running => write!(f, "Running"),
            ProcessorState::Released => write!(f, "Released"),
        }
    }
}

/// Stream configuration supplied by the host at prepare time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    pub sample_rate: f64,
    pub max_block_size: usize,
    /// Number of input channels
    pub channels: usize,
}

impl ProcessorConfig {
    pub fn new(sample_rate: f64, max_block_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels,
        }
    }

    /// Reject configurations the processor cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(GainKnobError::invalid_config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 {
            return Err(GainKnobError::invalid_config(
                "channel count must be at least 1",
            ));
        }
        if self.max_block_size == 0 {
            return Err(GainKnobError::invalid_config(
                "maximum block size must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new(48000.0, 512, 2)
    }
}

// ============================================================================
// Output Sinks
// ============================================================================

/// Sinks the audio thread writes and the UI polls
///
/// Cloning shares the same sinks.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOutputs {
    pub levels: Arc<LevelMeter>,
    pub waveform: Arc<WaveformRing>,
}

impl ProcessorOutputs {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Gain/saturation + EQ boost effect
pub struct GainKnobProcessor {
    params: Arc<ParameterStore>,
    outputs: ProcessorOutputs,
    state: ProcessorState,
    config: Option<ProcessorConfig>,
    coeffs: Option<CoefficientCache>,
    filters: ChannelFilters,
}

impl GainKnobProcessor {
    /// Create a processor reading from `params`
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self::with_outputs(params, ProcessorOutputs::new())
    }

    /// Create a processor publishing into existing sinks
    pub fn with_outputs(params: Arc<ParameterStore>, outputs: ProcessorOutputs) -> Self {
        Self {
            params,
            outputs,
            state: ProcessorState::Uninitialized,
            config: None,
            coeffs: None,
            filters: ChannelFilters::default(),
        }
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn outputs(&self) -> &ProcessorOutputs {
        &self.outputs
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Configuration of the last successful prepare
    pub fn config(&self) -> Option<&ProcessorConfig> {
        self.config.as_ref()
    }

    /// Coefficient set currently applied by every channel filter
    pub fn coefficients(&self) -> Option<&BiquadCoeffs> {
        self.coeffs.as_ref().map(CoefficientCache::coeffs)
    }

    /// Coefficient regenerations since the last prepare
    pub fn coefficient_regenerations(&self) -> u64 {
        self.coeffs
            .as_ref()
            .map(CoefficientCache::regenerations)
            .unwrap_or(0)
    }

    /// Number of per-channel filter states
    pub fn filter_channels(&self) -> usize {
        self.filters.num_channels()
    }

    /// Stream start: allocate filters and compute coefficients
    ///
    /// On error the processor keeps its previous state.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize, channels: usize) -> Result<()> {
        self.prepare_with(ProcessorConfig::new(sample_rate, max_block_size, channels))
    }

    /// [`GainKnobProcessor::prepare`] taking a config struct
    pub fn prepare_with(&mut self, config: ProcessorConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            warn!("Rejected prepare: {}", e);
            return Err(e);
        }

        let boost = self.params.eq_boost();
        let cache = CoefficientCache::new(config.sample_rate, boost)?;
        debug!("Initial EQ coefficients: {:?}", cache.coeffs());

        self.filters.reset_for(config.channels);
        self.coeffs = Some(cache);
        self.config = Some(config);
        self.state = ProcessorState::Prepared;

        info!(
            "Prepared: {} Hz, {} channel(s), max block {} (gain={}, eqBoost={})",
            config.sample_rate,
            config.channels,
            config.max_block_size,
            self.params.gain(),
            boost
        );
        Ok(())
    }

    /// Stream stop
    pub fn release(&mut self) {
        if self.state.is_active() {
            info!(
                "Released after {} coefficient regeneration(s)",
                self.coefficient_regenerations()
            );
        }
        self.coeffs = None;
        self.state = ProcessorState::Released;
    }

    /// Read parameters and refresh coefficients for one block
    #[inline]
    fn begin_block(&mut self) -> Option<(f32, BiquadCoeffs)> {
        let cache = self.coeffs.as_mut()?;
        if !self.state.is_active() {
            return None;
        }
        self.state = ProcessorState::Running;

        let gain = self.params.gain();
        cache.refresh(self.params.eq_boost());
        Some((gain, *cache.coeffs()))
    }

    /// Process one planar block in place
    ///
    /// Channels beyond the prepared input count are zeroed; only
    /// `min(prepared, provided)` channels are processed.
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let Some((gain, coeffs)) = self.begin_block() else {
            return;
        };
        let _no_denormals = ScopedNoDenormals::new();

        let declared = self.filters.num_channels();
        let provided = buffer.num_channels();
        for ch in declared..provided {
            buffer.clear_channel(ch);
        }

        let mut left = 0.0_f32;
        let mut right = 0.0_f32;
        for ch in 0..declared.min(provided) {
            let Some(samples) = buffer.get_channel_mut(ch) else {
                continue;
            };
            self.filters.process_channel(ch, samples, &coeffs);
            apply_gain_and_saturation(samples, gain);

            match ch {
                0 => left = left.max(update_peak(samples)),
                1 => right = right.max(update_peak(samples)),
                _ => {}
            }
        }

        self.outputs.levels.publish(left, right);
        if declared > 0 {
            if let Some(&first) = buffer.samples.first().and_then(|ch| ch.first()) {
                self.outputs.waveform.push(first);
            }
        }
    }

    /// Process one interleaved block in place
    ///
    /// `frames` is clamped to what `data` actually holds.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize, frames: usize) {
        if channels == 0 {
            return;
        }
        let Some((gain, coeffs)) = self.begin_block() else {
            return;
        };
        let _no_denormals = ScopedNoDenormals::new();

        let frames = frames.min(data.len() / channels);
        let data = &mut data[..frames * channels];

        let declared = self.filters.num_channels();
        for ch in declared..channels {
            data.iter_mut().skip(ch).step_by(channels).for_each(|s| *s = 0.0);
        }

        let mut left = 0.0_f32;
        let mut right = 0.0_f32;
        for ch in 0..declared.min(channels) {
            self.filters
                .process_channel_iter(ch, data.iter_mut().skip(ch).step_by(channels), &coeffs);
            apply_gain_and_saturation_iter(data.iter_mut().skip(ch).step_by(channels), gain);

            match ch {
                0 => left = left.max(peak_of(data.iter().skip(ch).step_by(channels))),
                1 => right = right.max(peak_of(data.iter().skip(ch).step_by(channels))),
                _ => {}
            }
        }

        self.outputs.levels.publish(left, right);
        if let Some(&first) = data.first() {
            self.outputs.waveform.push(first);
        }
    }
}

impl fmt::Debug for GainKnobProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GainKnobProcessor")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("filter_channels", &self.filters.num_channels())
            .field("regenerations", &self.coefficient_regenerations())
            .finish()
    }
}
