//! Editor-side views
//!
//! Everything the UI layer needs to turn the audio-thread sinks into
//! something drawable, without depending on a widget toolkit. Drawing goes
//! through the [`Renderer`] capability trait so a toolkit backend and the
//! terminal backend used by the CLI are interchangeable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::dsp::{clamp_unit, LevelMeter};
use crate::params::{ParameterId, ParameterStore};
use crate::visual::ring::WaveformRing;

/// Repaint cadence of the meter and waveform views
pub const REFRESH_HZ: u32 = 30;

/// Interval between two repaints
pub fn refresh_interval() -> Duration {
    Duration::from_secs_f64(1.0 / REFRESH_HZ as f64)
}

// ============================================================================
// Geometry
// ============================================================================

/// Map ring contents to a polyline inside a `width` x `height` box
///
/// Oldest sample on the left; a sample of 0.0 sits on the horizontal centre
/// line and +1.0 touches the top edge. A ring that was never fed yields no
/// points.
pub fn waveform_points(ring: &WaveformRing, width: f32, height: f32) -> Vec<(f32, f32)> {
    if ring.is_empty() {
        return Vec::new();
    }
    let capacity = ring.capacity() as f32;
    let mid = height / 2.0;
    ring.read_in_order()
        .enumerate()
        .map(|(i, s)| (i as f32 / capacity * width, mid - s * mid))
        .collect()
}

/// One vertical meter bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterBar {
    /// Level clamped to [0, 1]
    pub level: f32,
    /// Filled height in pixels
    pub fill_height: f32,
    /// Fill opacity, brighter when louder
    pub alpha: f32,
}

impl MeterBar {
    pub fn new(level: f32, height: f32) -> Self {
        let level = clamp_unit(level);
        Self {
            level,
            fill_height: height * level,
            alpha: level * 0.8 + 0.2,
        }
    }
}

/// Left/right meter bars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterBars {
    pub left: MeterBar,
    pub right: MeterBar,
}

impl MeterBars {
    pub fn from_levels(left: f32, right: f32, height: f32) -> Self {
        Self {
            left: MeterBar::new(left, height),
            right: MeterBar::new(right, height),
        }
    }

    pub fn from_meter(meter: &LevelMeter, height: f32) -> Self {
        let (left, right) = meter.levels();
        Self::from_levels(left, right, height)
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Drawing backend for the editor view
pub trait Renderer {
    /// Draw the waveform polyline, coordinates in the given box
    fn draw_waveform(&mut self, points: &[(f32, f32)], width: f32, height: f32);

    /// Draw both meter bars
    fn draw_meters(&mut self, bars: &MeterBars, height: f32);

    /// Draw a knob caption with its current value
    fn draw_label(&mut self, name: &str, value: f32);
}

/// Paint one full editor frame through `renderer`
pub fn paint_editor<R: Renderer>(
    renderer: &mut R,
    params: &ParameterStore,
    ring: &WaveformRing,
    meter: &LevelMeter,
    width: f32,
    height: f32,
) {
    for id in ParameterId::ALL {
        renderer.draw_label(id.spec().name, params.get(id));
    }
    renderer.draw_waveform(&waveform_points(ring, width, height), width, height);
    renderer.draw_meters(&MeterBars::from_meter(meter, height), height);
}

/// Character-cell renderer for terminals
#[derive(Debug, Clone)]
pub struct AsciiRenderer {
    columns: usize,
    rows: usize,
    out: String,
}

impl AsciiRenderer {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
            out: String::new(),
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Renderer for AsciiRenderer {
    fn draw_waveform(&mut self, points: &[(f32, f32)], width: f32, height: f32) {
        let mut grid = vec![vec![' '; self.columns]; self.rows];
        let mid_row = self.rows / 2;
        for cell in grid[mid_row].iter_mut() {
            *cell = '-';
        }
        if width > 0.0 && height > 0.0 {
            for &(x, y) in points {
                let col = ((x / width) * self.columns as f32) as usize;
                let row = ((y / height) * self.rows as f32).max(0.0) as usize;
                if let Some(cell) = grid
                    .get_mut(row.min(self.rows - 1))
                    .and_then(|r| r.get_mut(col.min(self.columns - 1)))
                {
                    *cell = '*';
                }
            }
        }
        for row in grid {
            self.out.push('|');
            self.out.extend(row);
            self.out.push_str("|\n");
        }
    }

    fn draw_meters(&mut self, bars: &MeterBars, _height: f32) {
        for (name, bar) in [("L", &bars.left), ("R", &bars.right)] {
            let filled = (bar.level * self.columns as f32).round() as usize;
            self.out.push_str(&format!(
                "{} [{}{}] {:.2}\n",
                name,
                "#".repeat(filled),
                " ".repeat(self.columns - filled.min(self.columns)),
                bar.level
            ));
        }
    }

    fn draw_label(&mut self, name: &str, value: f32) {
        self.out.push_str(&format!("{}: {:.1}\n", name, value));
    }
}

// ============================================================================
// Poller
// ============================================================================

/// What the editor saw on one repaint tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorFrame {
    /// Display levels, clamped to [0, 1]
    pub levels: (f32, f32),
    /// Meter update counter at the time of the tick
    pub meter_updates: u64,
    /// Ring write position at the time of the tick
    pub write_position: usize,
}

impl EditorFrame {
    pub fn capture(meter: &LevelMeter, ring: &WaveformRing) -> Self {
        Self {
            levels: meter.display_levels(),
            meter_updates: meter.updates(),
            write_position: ring.write_position(),
        }
    }
}

/// Frames an [`EditorPoller`] keeps; older ones only count toward the summary
pub const POLLER_HISTORY: usize = 256;

/// What an [`EditorPoller`] saw between spawn and finish
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerReport {
    /// Repaint ticks taken, including the final one
    pub ticks: u64,
    /// Loudest display level seen on either channel
    pub loudest: f32,
    /// Most recent frames, oldest first, at most [`POLLER_HISTORY`]
    pub recent: Vec<EditorFrame>,
}

impl PollerReport {
    /// The frame captured after polling stopped
    pub fn last(&self) -> Option<&EditorFrame> {
        self.recent.last()
    }
}

#[derive(Debug, Default)]
struct PollerLog {
    ticks: u64,
    loudest: f32,
    recent: VecDeque<EditorFrame>,
}

impl PollerLog {
    fn record(&mut self, frame: EditorFrame) {
        self.ticks += 1;
        self.loudest = self.loudest.max(frame.levels.0).max(frame.levels.1);
        if self.recent.len() == POLLER_HISTORY {
            self.recent.pop_front();
        }
        self.recent.push_back(frame);
    }

    fn into_report(self) -> PollerReport {
        PollerReport {
            ticks: self.ticks,
            loudest: self.loudest,
            recent: self.recent.into(),
        }
    }
}

/// UI-side thread sampling the sinks at [`REFRESH_HZ`]
///
/// Memory stays bounded however long it runs.
#[derive(Debug)]
pub struct EditorPoller {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<PollerReport>,
}

impl EditorPoller {
    /// Start polling `meter` and `ring` every `interval`
    pub fn spawn(meter: Arc<LevelMeter>, ring: Arc<WaveformRing>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut log = PollerLog {
                    recent: VecDeque::with_capacity(POLLER_HISTORY),
                    ..Default::default()
                };
                while !stop.load(Ordering::Acquire) {
                    log.record(EditorFrame::capture(&meter, &ring));
                    thread::sleep(interval);
                }
                // One last look so the final block is always seen.
                log.record(EditorFrame::capture(&meter, &ring));
                log.into_report()
            })
        };
        Self { stop, handle }
    }

    /// Stop polling and return what was seen
    pub fn finish(self) -> PollerReport {
        self.stop.store(true, Ordering::Release);
        let report = self.handle.join().unwrap_or_default();
        debug!(
            "Editor poller took {} ticks, kept {}",
            report.ticks,
            report.recent.len()
        );
        report
    }
}
