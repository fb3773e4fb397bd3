//! Visualization Ring Buffer
//!
//! Fixed-capacity circular buffer of `f32` samples written by the audio
//! thread (one sample per processed block) and read by the UI paint cycle.
//! Slots and the write position are atomics, so pushing never blocks and a
//! reader never sees a torn sample.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Default number of samples kept for the waveform view
pub const WAVEFORM_CAPACITY: usize = 1024;

/// Lock-free single-writer ring of display samples
#[derive(Debug)]
pub struct WaveformRing {
    slots: Box<[AtomicU32]>,
    write_pos: AtomicUsize,
    fed: AtomicBool,
}

impl WaveformRing {
    /// Allocate a ring of [`WAVEFORM_CAPACITY`] zeroed samples
    pub fn new() -> Self {
        Self::with_capacity(WAVEFORM_CAPACITY)
    }

    /// Allocate a ring of `capacity` zeroed samples (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity.max(1))
            .map(|_| AtomicU32::new(0.0_f32.to_bits()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            write_pos: AtomicUsize::new(0),
            fed: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True until the first push
    ///
    /// The write position alone cannot tell, since it wraps back to 0.
    pub fn is_empty(&self) -> bool {
        !self.fed.load(Ordering::Acquire)
    }

    /// Index the next push will write to, always in `0..capacity`
    pub fn write_position(&self) -> usize {
        self.write_pos.load(Ordering::Acquire)
    }

    /// Append one sample, overwriting the oldest
    ///
    /// Only one thread may push.
    #[inline]
    pub fn push(&self, sample: f32) {
        let pos = self.write_pos.load(Ordering::Relaxed);
        self.slots[pos].store(sample.to_bits(), Ordering::Relaxed);
        let next = if pos + 1 >= self.slots.len() { 0 } else { pos + 1 };
        self.write_pos.store(next, Ordering::Release);
        if !self.fed.load(Ordering::Relaxed) {
            self.fed.store(true, Ordering::Release);
        }
    }

    /// Samples from oldest to newest, exactly `capacity` of them
    ///
    /// The iterator is lazy and `Clone`; cloning restarts from the same
    /// snapshot of the write position.
    pub fn read_in_order(&self) -> WaveformIter<'_> {
        WaveformIter {
            ring: self,
            start: self.write_position(),
            offset: 0,
        }
    }

    /// Copy the ordered contents into `out` (up to `out.len()` samples)
    pub fn copy_in_order(&self, out: &mut [f32]) -> usize {
        let mut written = 0;
        for (dst, src) in out.iter_mut().zip(self.read_in_order()) {
            *dst = src;
            written += 1;
        }
        written
    }

    #[inline]
    fn load(&self, index: usize) -> f32 {
        f32::from_bits(self.slots[index].load(Ordering::Relaxed))
    }
}

impl Default for WaveformRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Chronological view over a [`WaveformRing`]
#[derive(Debug, Clone)]
pub struct WaveformIter<'a> {
    ring: &'a WaveformRing,
    start: usize,
    offset: usize,
}

impl Iterator for WaveformIter<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let capacity = self.ring.capacity();
        if self.offset >= capacity {
            return None;
        }
        let index = (self.start + self.offset) % capacity;
        self.offset += 1;
        Some(self.ring.load(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ring.capacity() - self.offset;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WaveformIter<'_> {}
