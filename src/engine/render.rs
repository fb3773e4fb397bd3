//! Offline host
//!
//! Drives a processor over a whole buffer in fixed-size blocks, the way a
//! host would call it from its audio callback.

use log::info;

use crate::engine::buffer::AudioBuffer;
use crate::engine::processor::GainKnobProcessor;
use crate::error::{GainKnobError, Result};

/// Summary of an offline render
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderReport {
    /// Blocks handed to the processor
    pub blocks: usize,
    /// Frames processed
    pub frames: usize,
    /// Highest left level published over the render
    pub max_left: f32,
    /// Highest right level published over the render
    pub max_right: f32,
    /// Coefficient regenerations during the render
    pub coefficient_regenerations: u64,
}

/// Process `buffer` in place through `processor`, `block_size` frames at a time
///
/// The processor must already be prepared; the final block may be short.
pub fn render_offline(
    processor: &mut GainKnobProcessor,
    buffer: &mut AudioBuffer,
    block_size: usize,
) -> Result<RenderReport> {
    if !processor.state().is_active() {
        return Err(GainKnobError::NotPrepared {
            operation: "render_offline".to_string(),
        });
    }
    if block_size == 0 {
        return Err(GainKnobError::invalid_config("block size must be at least 1"));
    }

    let regenerations_before = processor.coefficient_regenerations();
    let total = buffer.num_samples();
    let mut report = RenderReport::default();
    let mut block = AudioBuffer::new(buffer.num_channels(), 0, buffer.sample_rate);

    let mut start = 0;
    while start < total {
        let len = block_size.min(total - start);
        for (dst, src) in block.samples.iter_mut().zip(&buffer.samples) {
            dst.clear();
            dst.extend_from_slice(&src[start..start + len]);
        }

        processor.process(&mut block);

        for (dst, src) in buffer.samples.iter_mut().zip(&block.samples) {
            dst[start..start + len].copy_from_slice(src);
        }

        let (left, right) = processor.outputs().levels.levels();
        report.max_left = report.max_left.max(left);
        report.max_right = report.max_right.max(right);
        report.blocks += 1;
        report.frames += len;
        start += len;
    }

    report.coefficient_regenerations =
        processor.coefficient_regenerations() - regenerations_before;
    info!(
        "Rendered {} frames in {} blocks (peak L {:.3}, R {:.3})",
        report.frames, report.blocks, report.max_left, report.max_right
    );
    Ok(report)
}
