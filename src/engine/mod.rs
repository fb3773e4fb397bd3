//! Audio Engine Module
//!
//! Host-facing processing engine:
//! - Audio buffer management
//! - Block processing orchestrator (prepare / process / release)
//! - Offline rendering and WAV file I/O

pub mod buffer;
pub mod io;
pub mod processor;
pub mod render;

pub use buffer::{AudioBuffer, DEFAULT_SAMPLE_RATE};
pub use io::{export_audio, generate_test_tone, import_audio, ExportFormat};
pub use processor::{GainKnobProcessor, ProcessorConfig, ProcessorOutputs, ProcessorState};
pub use render::{render_offline, RenderReport};
