//! Peaking EQ Biquad
//!
//! Coefficient generation for the single fixed peaking (bell) filter, the
//! edge-triggered coefficient cache, and per-channel filter history.
//!
//! Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)

use std::f64::consts::PI;

use crate::error::{GainKnobError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Centre frequency of the EQ boost
pub const EQ_CENTER_HZ: f32 = 400.0;

/// Bandwidth of the EQ boost
pub const EQ_Q: f32 = 0.707;

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

// ============================================================================
// Coefficients
// ============================================================================

/// Normalised biquad coefficients and the values they were derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
    pub sample_rate: f64,
    pub frequency: f32,
    pub q: f32,
    /// Linear peak gain at the centre frequency
    pub peak_gain: f32,
}

impl BiquadCoeffs {
    /// Pass-through coefficient set
    pub fn identity(sample_rate: f64) -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            sample_rate,
            frequency: EQ_CENTER_HZ,
            q: EQ_Q,
            peak_gain: 1.0,
        }
    }

    /// Whether every filter coefficient is a finite number
    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }

    /// Peaking filter from the Audio EQ Cookbook
    ///
    /// `peak_gain` is linear; the cookbook amplitude is its square root.
    fn peak(sample_rate: f64, frequency: f32, q: f32, peak_gain: f32) -> Self {
        let a = (peak_gain.max(0.0) as f64).sqrt();
        let w0 = 2.0 * PI * frequency as f64 / sample_rate;
        let alpha = w0.sin() / (2.0 * q as f64);
        let c2 = -2.0 * w0.cos();

        let b0 = 1.0 + alpha * a;
        let b1 = c2;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = c2;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
            sample_rate,
            frequency,
            q,
            peak_gain,
        }
    }

    /// Magnitude response at `freq` Hz
    pub fn magnitude_at(&self, freq: f64) -> f64 {
        let w = 2.0 * PI * freq / self.sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 as f64 + self.b1 as f64 * cos1 + self.b2 as f64 * cos2;
        let num_im = -(self.b1 as f64 * sin1 + self.b2 as f64 * sin2);
        let den_re = 1.0 + self.a1 as f64 * cos1 + self.a2 as f64 * cos2;
        let den_im = -(self.a1 as f64 * sin1 + self.a2 as f64 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Compute peaking-filter coefficients for the EQ boost
///
/// The raw boost value is read as decibels: `boost_db = 0` yields unity
/// gain, not a bypass flag. A boost with no finite coefficient set (NaN,
/// or extreme enough to overflow or underflow the peak gain) yields
/// [`BiquadCoeffs::identity`].
///
/// # Errors
/// `InvalidConfiguration` if `sample_rate` is not a positive finite number.
pub fn compute_coefficients(sample_rate: f64, boost_db: f32) -> Result<BiquadCoeffs> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(GainKnobError::invalid_config(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    Ok(boost_or_identity(sample_rate, boost_db))
}

fn boost_or_identity(sample_rate: f64, boost_db: f32) -> BiquadCoeffs {
    let coeffs = BiquadCoeffs::peak(sample_rate, EQ_CENTER_HZ, EQ_Q, db_to_linear(boost_db));
    if coeffs.is_finite() {
        coeffs
    } else {
        BiquadCoeffs::identity(sample_rate)
    }
}

// ============================================================================
// Coefficient Cache
// ============================================================================

/// Edge-triggered holder of the current coefficient set
///
/// Lives on the audio thread. The whole set is replaced at once between
/// blocks and lent by shared reference to every channel filter, so no filter
/// ever sees a partially updated set.
#[derive(Debug, Clone)]
pub struct CoefficientCache {
    coeffs: BiquadCoeffs,
    last_boost: f32,
    regenerations: u64,
}

impl CoefficientCache {
    /// Compute the initial set for `boost_db`
    pub fn new(sample_rate: f64, boost_db: f32) -> Result<Self> {
        Ok(Self {
            coeffs: compute_coefficients(sample_rate, boost_db)?,
            last_boost: boost_db,
            regenerations: 0,
        })
    }

    /// Recompute if `boost_db` differs bitwise from the last seen value
    ///
    /// Returns true if the set was regenerated. A NaN boost regenerates once,
    /// not on every call.
    #[inline]
    pub fn refresh(&mut self, boost_db: f32) -> bool {
        if boost_db.to_bits() == self.last_boost.to_bits() {
            return false;
        }
        // Sample rate was validated when the cache was built.
        self.coeffs = boost_or_identity(self.coeffs.sample_rate, boost_db);
        self.last_boost = boost_db;
        self.regenerations += 1;
        true
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    pub fn last_boost(&self) -> f32 {
        self.last_boost
    }

    /// Number of regenerations since construction (the initial set not counted)
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }
}

// ============================================================================
// Filter State
// ============================================================================

/// Biquad history for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    x1: f32, // x[n-1]
    x2: f32, // x[n-2]
    y1: f32, // y[n-1]
    y2: f32, // y[n-2]
}

impl BiquadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single sample (direct form I)
    #[inline]
    pub fn process_sample(&mut self, input: f32, c: &BiquadCoeffs) -> f32 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Filter any sequence of samples in place
    ///
    /// Works for contiguous slices and strided views of interleaved data alike.
    #[inline]
    pub fn process_iter<'a, I>(&mut self, samples: I, c: &BiquadCoeffs)
    where
        I: Iterator<Item = &'a mut f32>,
    {
        for sample in samples {
            *sample = self.process_sample(*sample, c);
        }
    }

    /// Filter a contiguous block in place
    #[inline]
    pub fn process_block(&mut self, samples: &mut [f32], c: &BiquadCoeffs) {
        self.process_iter(samples.iter_mut(), c);
    }
}

/// One [`BiquadState`] per input channel
#[derive(Debug, Clone, Default)]
pub struct ChannelFilters {
    states: Vec<BiquadState>,
}

impl ChannelFilters {
    pub fn new(num_channels: usize) -> Self {
        Self {
            states: vec![BiquadState::default(); num_channels],
        }
    }

    /// Resize to `num_channels` and clear every history
    ///
    /// Allocates; call from `prepare`, never from the audio callback.
    pub fn reset_for(&mut self, num_channels: usize) {
        self.states.clear();
        self.states.resize(num_channels, BiquadState::default());
    }

    pub fn num_channels(&self) -> usize {
        self.states.len()
    }

    /// Run `samples` through channel `channel`'s history
    ///
    /// An index outside the prepared channel range leaves `samples` untouched.
    #[inline]
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32], c: &BiquadCoeffs) {
        if let Some(state) = self.states.get_mut(channel) {
            state.process_block(samples, c);
        }
    }

    /// Same as [`ChannelFilters::process_channel`] for a strided sample view
    #[inline]
    pub fn process_channel_iter<'a, I>(&mut self, channel: usize, samples: I, c: &BiquadCoeffs)
    where
        I: Iterator<Item = &'a mut f32>,
    {
        if let Some(state) = self.states.get_mut(channel) {
            state.process_iter(samples, c);
        }
    }

    pub fn state(&self, channel: usize) -> Option<&BiquadState> {
        self.states.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_zero_boost_is_unity() {
        let c = compute_coefficients(48000.0, 0.0).unwrap();
        assert_abs_diff_eq!(c.peak_gain, 1.0, epsilon = 1e-6);
        // Numerator and denominator coincide at unity gain.
        assert_abs_diff_eq!(c.b0, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.b1, c.a1, epsilon = 1e-6);
        assert_abs_diff_eq!(c.b2, c.a2, epsilon = 1e-6);
    }

    #[test_case(44100.0, 6.0)]
    #[test_case(48000.0, 10.0)]
    #[test_case(96000.0, 3.0)]
    fn test_peak_gain_at_center(sample_rate: f64, boost_db: f32) {
        let c = compute_coefficients(sample_rate, boost_db).unwrap();
        let expected = 10.0_f64.powf(boost_db as f64 / 20.0);
        assert_abs_diff_eq!(c.magnitude_at(EQ_CENTER_HZ as f64), expected, epsilon = 1e-3);
        // Far away from the bell the response returns to unity.
        assert_abs_diff_eq!(c.magnitude_at(15000.0), 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_records_derivation_parameters() {
        let c = compute_coefficients(44100.0, 6.0).unwrap();
        assert_eq!(c.sample_rate, 44100.0);
        assert_eq!(c.frequency, EQ_CENTER_HZ);
        assert_eq!(c.q, EQ_Q);
        assert_abs_diff_eq!(c.peak_gain, 1.995_262, epsilon = 1e-4);
    }

    #[test_case(0.0)]
    #[test_case(-48000.0)]
    #[test_case(f64::NAN)]
    #[test_case(f64::INFINITY)]
    fn test_invalid_sample_rate_rejected(sample_rate: f64) {
        let err = compute_coefficients(sample_rate, 3.0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIGURATION");
    }

    #[test]
    fn test_cache_is_edge_triggered() {
        let mut cache = CoefficientCache::new(48000.0, 0.0).unwrap();
        for _ in 0..10 {
            assert!(!cache.refresh(0.0));
        }
        assert_eq!(cache.regenerations(), 0);

        assert!(cache.refresh(5.0));
        assert!(!cache.refresh(5.0));
        assert!(cache.refresh(2.0));
        assert_eq!(cache.regenerations(), 2);
        assert_eq!(cache.last_boost(), 2.0);
        assert_eq!(*cache.coeffs(), compute_coefficients(48000.0, 2.0).unwrap());
    }

    #[test_case(f32::NAN ; "nan")]
    #[test_case(-1000.0 ; "underflowing cut")]
    #[test_case(1000.0 ; "overflowing boost")]
    fn test_degenerate_boost_falls_back_to_identity(boost_db: f32) {
        let c = compute_coefficients(48000.0, boost_db).unwrap();
        assert!(c.is_finite());
        assert_eq!(c, BiquadCoeffs::identity(48000.0));
    }

    #[test]
    fn test_nan_boost_regenerates_once() {
        let mut cache = CoefficientCache::new(48000.0, 0.0).unwrap();
        assert!(cache.refresh(f32::NAN));
        for _ in 0..10 {
            assert!(!cache.refresh(f32::NAN));
        }
        assert_eq!(cache.regenerations(), 1);
        assert_eq!(*cache.coeffs(), BiquadCoeffs::identity(48000.0));

        assert!(cache.refresh(6.0));
        assert_eq!(*cache.coeffs(), compute_coefficients(48000.0, 6.0).unwrap());
    }

    #[test]
    fn test_identity_is_exact_passthrough() {
        let c = BiquadCoeffs::identity(44100.0);
        let input = sine(440.0, 44100.0, 64);
        let mut output = input.clone();
        BiquadState::new().process_block(&mut output, &c);
        assert_eq!(output, input);
    }

    #[test]
    fn test_unity_filter_passes_signal() {
        let c = compute_coefficients(48000.0, 0.0).unwrap();
        let input = sine(1000.0, 48000.0, 256);
        let mut output = input.clone();
        BiquadState::new().process_block(&mut output, &c);
        for (a, b) in input.iter().zip(&output) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_boost_raises_level_at_center() {
        let c = compute_coefficients(48000.0, 10.0).unwrap();
        let mut samples = sine(400.0, 48000.0, 48000);
        BiquadState::new().process_block(&mut samples, &c);
        // Skip the transient, then compare steady-state peak.
        let peak = samples[24000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert_abs_diff_eq!(peak, 3.162, epsilon = 0.05);
    }

    #[test]
    fn test_block_matches_sample_by_sample() {
        let c = compute_coefficients(44100.0, 7.5).unwrap();
        let input = sine(300.0, 44100.0, 128);

        let mut block = input.clone();
        BiquadState::new().process_block(&mut block, &c);

        let mut state = BiquadState::new();
        let per_sample: Vec<f32> = input.iter().map(|&x| state.process_sample(x, &c)).collect();
        assert_eq!(block, per_sample);
    }

    #[test]
    fn test_channels_are_independent() {
        let c = compute_coefficients(48000.0, 8.0).unwrap();
        let mut filters = ChannelFilters::new(2);

        let mut left = sine(400.0, 48000.0, 64);
        filters.process_channel(0, &mut left, &c);
        assert_eq!(filters.state(1), Some(&BiquadState::default()));

        let mut right = vec![0.0; 64];
        filters.process_channel(1, &mut right, &c);
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_out_of_range_channel_is_noop() {
        let c = compute_coefficients(48000.0, 8.0).unwrap();
        let mut filters = ChannelFilters::new(1);
        let mut samples = vec![0.5; 16];
        filters.process_channel(3, &mut samples, &c);
        assert!(samples.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_strided_matches_contiguous() {
        let c = compute_coefficients(48000.0, 4.0).unwrap();
        let left = sine(440.0, 48000.0, 32);
        let mut interleaved: Vec<f32> = left.iter().flat_map(|&s| [s, 0.0]).collect();

        let mut contiguous = left.clone();
        ChannelFilters::new(2).process_channel(0, &mut contiguous, &c);

        ChannelFilters::new(2).process_channel_iter(0, interleaved.iter_mut().step_by(2), &c);
        let strided: Vec<f32> = interleaved.iter().step_by(2).copied().collect();
        assert_eq!(strided, contiguous);
    }

    #[test]
    fn test_reset_for_clears_history() {
        let c = compute_coefficients(48000.0, 8.0).unwrap();
        let mut filters = ChannelFilters::new(2);
        let mut samples = vec![1.0; 8];
        filters.process_channel(0, &mut samples, &c);
        assert_ne!(filters.state(0), Some(&BiquadState::default()));

        filters.reset_for(3);
        assert_eq!(filters.num_channels(), 3);
        assert_eq!(filters.state(0), Some(&BiquadState::default()));
    }
}
