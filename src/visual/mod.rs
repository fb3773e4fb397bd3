//! Visualization
//!
//! UI-facing side of the processor: the decimated waveform ring the audio
//! thread feeds, and render-free views the editor builds from it.

pub mod ring;
pub mod view;

pub use ring::{WaveformIter, WaveformRing, WAVEFORM_CAPACITY};
pub use view::{
    paint_editor, refresh_interval, waveform_points, AsciiRenderer, EditorFrame, EditorPoller,
    MeterBar, MeterBars, PollerReport, Renderer, POLLER_HISTORY, REFRESH_HZ,
};
