//! Audio Buffer
//!
//! Planar (non-interleaved) `f32` block storage used by the offline host,
//! file I/O and tests. The real-time processor also accepts interleaved
//! slices directly, see [`crate::engine::GainKnobProcessor::process_interleaved`].

use crate::dsp::meter::{linear_to_db, update_peak};
use crate::error::{GainKnobError, Result};

/// Default sample rate for generated buffers
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Multi-channel planar audio buffer
///
/// # Example
/// ```
/// use gainknob::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 512, 48000);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    pub fn new(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Wrap existing per-channel data
    ///
    /// # Errors
    /// `InvalidAudio` if the channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            if let Some(bad) = samples.iter().position(|ch| ch.len() != first.len()) {
                return Err(GainKnobError::InvalidAudio {
                    reason: format!(
                        "channel {} has {} samples, expected {}",
                        bad,
                        samples[bad].len(),
                        first.len()
                    ),
                    source: None,
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data
    ///
    /// # Errors
    /// `InvalidAudio` if `channels` is zero or does not divide the data length.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(GainKnobError::InvalidAudio {
                reason: "channel count must be at least 1".to_string(),
                source: None,
            });
        }
        if interleaved.len() % channels != 0 {
            return Err(GainKnobError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
                source: None,
            });
        }

        let frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(frames); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert to interleaved order (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.num_channels() * self.num_samples());
        for i in 0..self.num_samples() {
            for channel in &self.samples {
                interleaved.push(channel[i]);
            }
        }
        interleaved
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Immutable access to a channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to a channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Non-panicking mutable channel access
    #[inline]
    pub fn get_channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.samples.get_mut(index).map(|ch| ch.as_mut_slice())
    }

    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Returns false if the indices are out of bounds
    #[inline]
    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) -> bool {
        if let Some(sample) = self.samples.get_mut(channel).and_then(|ch| ch.get_mut(index)) {
            *sample = value;
            return true;
        }
        false
    }

    /// Zero one channel
    #[inline]
    pub fn clear_channel(&mut self, index: usize) {
        if let Some(ch) = self.samples.get_mut(index) {
            ch.fill(0.0);
        }
    }

    /// Zero every channel
    pub fn clear(&mut self) {
        for ch in &mut self.samples {
            ch.fill(0.0);
        }
    }

    /// Peak magnitude of one channel (0.0 if out of range)
    pub fn channel_peak(&self, index: usize) -> f32 {
        self.samples.get(index).map(|ch| update_peak(ch)).unwrap_or(0.0)
    }

    /// Peak magnitude across all channels in dBFS
    pub fn peak_db(&self) -> f32 {
        let peak = (0..self.num_channels())
            .map(|ch| self.channel_peak(ch))
            .fold(0.0_f32, f32::max);
        linear_to_db(peak)
    }

    /// Check that every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().flatten().all(|s| s.is_finite())
    }

    /// Copy `len` frames starting at `start` into a new buffer
    pub fn slice(&self, start: usize, len: usize) -> AudioBuffer {
        let end = (start + len).min(self.num_samples());
        let start = start.min(end);
        AudioBuffer {
            samples: self.samples.iter().map(|ch| ch[start..end].to_vec()).collect(),
            sample_rate: self.sample_rate,
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(2, 0, DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_is_silent() {
        let buffer = AudioBuffer::new(2, 100, 44100);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 100);
        assert!(buffer.samples.iter().flatten().all(|&s| s == 0.0));
        assert!(buffer.peak_db().is_infinite());
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2, 48000).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_from_interleaved_rejects_bad_length() {
        assert!(AudioBuffer::from_interleaved(&[0.0; 5], 2, 48000).is_err());
        assert!(AudioBuffer::from_interleaved(&[0.0; 4], 0, 48000).is_err());
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let err = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 48000);
        assert!(err.is_err());
    }

    #[test]
    fn test_sample_access_is_bounds_checked() {
        let mut buffer = AudioBuffer::new(1, 4, 48000);
        assert!(buffer.set_sample(0, 3, 0.5));
        assert!(!buffer.set_sample(1, 0, 0.5));
        assert_eq!(buffer.get_sample(0, 3), Some(0.5));
        assert_eq!(buffer.get_sample(0, 4), None);
        assert!(buffer.get_channel_mut(2).is_none());
    }

    #[test]
    fn test_clear_channel() {
        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0; 3], vec![1.0; 3]], 48000).unwrap();
        buffer.clear_channel(1);
        buffer.clear_channel(7);
        assert_eq!(buffer.channel(0), &[1.0, 1.0, 1.0]);
        assert_eq!(buffer.channel(1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_peak() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![0.2, -0.9, 0.3], vec![0.5, 0.0, 0.0]], 48000).unwrap();
        assert_eq!(buffer.channel_peak(0), 0.9);
        assert_eq!(buffer.channel_peak(1), 0.5);
        assert_eq!(buffer.channel_peak(2), 0.0);
        assert!((buffer.peak_db() - (-0.915)).abs() < 0.01);
    }

    #[test]
    fn test_slice_clamps() {
        let buffer = AudioBuffer::from_channels(vec![vec![1.0, 2.0, 3.0]], 48000).unwrap();
        assert_eq!(buffer.slice(1, 10).channel(0), &[2.0, 3.0]);
        assert!(buffer.slice(5, 2).is_empty());
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(1, 24000, 48000);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-9);
    }
}
