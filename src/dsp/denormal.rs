//! Denormal Suppression
//!
//! RAII guard that flushes subnormal floats to zero for the lifetime of one
//! processing block and restores the caller's floating-point mode afterwards.
//!
//! On x86_64 this sets FTZ (bit 15) and DAZ (bit 6) in MXCSR. The register is
//! per-thread, so the guard only affects the audio thread that created it.
//! Other architectures get a no-op guard.

#[cfg(target_arch = "x86_64")]
const FTZ_DAZ: u32 = 0x8040;

/// Flush-to-zero scope for one block
#[must_use = "denormals are only suppressed while the guard is alive"]
#[derive(Debug)]
pub struct ScopedNoDenormals {
    #[cfg(target_arch = "x86_64")]
    previous: u32,
}

impl ScopedNoDenormals {
    #[inline]
    #[allow(deprecated)]
    pub fn new() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};
            // SAFETY: reading and writing MXCSR only changes floating-point
            // rounding/denormal behaviour of the current thread.
            let previous = unsafe { _mm_getcsr() };
            unsafe { _mm_setcsr(previous | FTZ_DAZ) };
            Self { previous }
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            Self {}
        }
    }
}

impl Default for ScopedNoDenormals {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedNoDenormals {
    #[inline]
    #[allow(deprecated)]
    fn drop(&mut self) {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: restores the value read in `new` on the same thread.
            unsafe { std::arch::x86_64::_mm_setcsr(self.previous) };
        }
    }
}

/// Whether flush-to-zero is currently active on this thread
#[allow(deprecated)]
pub fn denormals_flushed() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: read-only access to MXCSR.
        let mxcsr = unsafe { std::arch::x86_64::_mm_getcsr() };
        mxcsr & FTZ_DAZ == FTZ_DAZ
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}
