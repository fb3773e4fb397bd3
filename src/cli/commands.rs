//! CLI Command Implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::dsp::biquad::compute_coefficients;
use crate::engine::io::{export_audio, generate_test_tone, import_audio, ExportFormat};
use crate::engine::processor::GainKnobProcessor;
use crate::engine::render::render_offline;
use crate::error::Result;
use crate::params::{knob_db_to_linear, ParameterStore, PluginState, EQ_BOOST_SPEC, GAIN_SPEC};
use crate::visual::{paint_editor, refresh_interval, AsciiRenderer, EditorPoller};

/// Parameter overrides for a render
#[derive(Debug, Clone, Default)]
pub struct RenderOptions<'a> {
    pub gain: Option<f32>,
    /// Gain knob position in dB, used when `gain` is not set
    pub gain_db: Option<f32>,
    pub eq_boost: Option<f32>,
    pub block_size: usize,
    pub state: Option<&'a Path>,
    pub show: bool,
    pub monitor: bool,
}

/// Linear gain from either the linear flag or the dB knob position
fn resolve_gain(gain: Option<f32>, gain_db: Option<f32>) -> Option<f32> {
    gain.or_else(|| {
        gain_db.map(|db| {
            if !GAIN_SPEC.contains(db) {
                warn!("Gain knob {} dB outside [{}, {}], clamping", db, GAIN_SPEC.min, GAIN_SPEC.max);
            }
            knob_db_to_linear(GAIN_SPEC.clamp(db))
        })
    })
}

/// Build the parameter store: saved state first, explicit flags on top
fn load_params(state: Option<&Path>, gain: Option<f32>, eq_boost: Option<f32>) -> Result<ParameterStore> {
    let params = ParameterStore::new();
    if let Some(path) = state {
        info!("Loading state: {}", path.display());
        let data = fs::read(path)?;
        params.restore(&PluginState::from_json_bytes(&data)?);
    }
    if let Some(g) = gain {
        if !GAIN_SPEC.contains(g) {
            warn!("Gain {} outside [{}, {}], clamping", g, GAIN_SPEC.min, GAIN_SPEC.max);
        }
        params.set_gain(GAIN_SPEC.clamp(g));
    }
    if let Some(b) = eq_boost {
        if !EQ_BOOST_SPEC.contains(b) {
            warn!("EQ boost {} outside [{}, {}], clamping", b, EQ_BOOST_SPEC.min, EQ_BOOST_SPEC.max);
        }
        params.set_eq_boost(EQ_BOOST_SPEC.clamp(b));
    }
    Ok(params)
}

/// Process a WAV file through the effect and write 32-bit float output
pub fn render(input: &Path, output: &Path, options: RenderOptions<'_>) -> Result<()> {
    info!("Rendering {} -> {}", input.display(), output.display());

    let gain = resolve_gain(options.gain, options.gain_db);
    let params = Arc::new(load_params(options.state, gain, options.eq_boost)?);
    let mut buffer = import_audio(input)?;

    let mut processor = GainKnobProcessor::new(Arc::clone(&params));
    processor.prepare(
        buffer.sample_rate as f64,
        options.block_size,
        buffer.num_channels(),
    )?;

    let poller = options.monitor.then(|| {
        let outputs = processor.outputs();
        EditorPoller::spawn(
            Arc::clone(&outputs.levels),
            Arc::clone(&outputs.waveform),
            refresh_interval(),
        )
    });

    let result = render_offline(&mut processor, &mut buffer, options.block_size);
    processor.release();
    let editor = poller.map(EditorPoller::finish);
    let report = result?;

    if let Some(editor) = editor {
        println!(
            "Editor frames: {}  Loudest displayed level: {:.2}",
            editor.ticks, editor.loudest
        );
    }

    export_audio(&buffer, output, ExportFormat::float())?;

    println!("Rendered: {}", output.display());
    println!("Gain: {:.2}  EQ boost: {:.2} dB", params.gain(), params.eq_boost());
    println!(
        "Frames: {}  Blocks: {}  Peak L/R: {:.3} / {:.3}",
        report.frames, report.blocks, report.max_left, report.max_right
    );

    if options.show {
        let outputs = processor.outputs();
        let mut renderer = AsciiRenderer::new(64, 12);
        paint_editor(&mut renderer, &params, &outputs.waveform, &outputs.levels, 64.0, 12.0);
        println!("{}", renderer.into_string());
    }

    Ok(())
}

/// Write a sine test tone
pub fn tone(
    output: &Path,
    frequency: f32,
    duration: f32,
    amplitude: f32,
    sample_rate: u32,
    channels: usize,
) -> Result<()> {
    info!("Generating {} Hz tone: {}", frequency, output.display());

    let buffer = generate_test_tone(frequency, duration, sample_rate, channels.max(1), amplitude);
    export_audio(&buffer, output, ExportFormat::default())?;

    println!(
        "Tone written: {} ({} frames, {} ch)",
        output.display(),
        buffer.num_samples(),
        buffer.num_channels()
    );
    Ok(())
}

/// Print the EQ coefficients for a sample rate and boost
pub fn coefficients(sample_rate: f64, eq_boost: f32) -> Result<()> {
    let boost = EQ_BOOST_SPEC.clamp(eq_boost);
    let c = compute_coefficients(sample_rate, boost)?;

    println!("Peaking EQ @ {} Hz, Q {}, {:+.2} dB", c.frequency, c.q, boost);
    println!("{:-<40}", "");
    println!("b0 = {:.9}", c.b0);
    println!("b1 = {:.9}", c.b1);
    println!("b2 = {:.9}", c.b2);
    println!("a1 = {:.9}", c.a1);
    println!("a2 = {:.9}", c.a2);
    println!("{:-<40}", "");
    println!("Gain at centre: {:.4}", c.magnitude_at(c.frequency as f64));
    Ok(())
}

/// Write a parameter state file
pub fn save_state(path: &Path, gain: Option<f32>, eq_boost: Option<f32>) -> Result<()> {
    info!("Saving state: {}", path.display());

    let params = load_params(None, gain, eq_boost)?;
    let state = params.snapshot();
    fs::write(path, state.to_json_bytes()?)?;

    println!("State saved: {}", path.display());
    println!("Gain: {:.2}  EQ boost: {:.2} dB", state.gain, state.eq_boost);
    Ok(())
}
