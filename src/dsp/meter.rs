//! Peak Metering
//!
//! Block peak detection plus the two-channel level sink the audio thread
//! publishes into and the UI polls.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Maximum absolute sample in a block (0.0 for an empty block)
#[inline]
pub fn update_peak(samples: &[f32]) -> f32 {
    peak_of(samples.iter())
}

/// Strided variant of [`update_peak`]
#[inline]
pub fn peak_of<'a, I>(samples: I) -> f32
where
    I: Iterator<Item = &'a f32>,
{
    samples.fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// Convert linear amplitude to decibels (-inf for silence)
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Left/right peak levels shared between audio and UI threads
///
/// Single writer (audio callback), any number of readers. Each level is an
/// independent atomic; a reader may see left from one block and right from
/// the next, which is acceptable for display.
#[derive(Debug, Default)]
pub struct LevelMeter {
    left: AtomicU32,
    right: AtomicU32,
    updates: AtomicU64,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the raw peak levels of the latest block
    #[inline]
    pub fn publish(&self, left: f32, right: f32) {
        self.left.store(left.to_bits(), Ordering::Relaxed);
        self.right.store(right.to_bits(), Ordering::Relaxed);
        self.updates.fetch_add(1, Ordering::Release);
    }

    /// Raw levels as published (may exceed 1.0)
    pub fn levels(&self) -> (f32, f32) {
        (
            f32::from_bits(self.left.load(Ordering::Relaxed)),
            f32::from_bits(self.right.load(Ordering::Relaxed)),
        )
    }

    /// Levels clamped to [0, 1] for drawing
    pub fn display_levels(&self) -> (f32, f32) {
        let (l, r) = self.levels();
        (clamp_unit(l), clamp_unit(r))
    }

    /// Number of blocks published so far
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Acquire)
    }
}

/// Clamp to [0, 1]; NaN maps to 0
#[inline]
pub fn clamp_unit(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
