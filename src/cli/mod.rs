//! CLI Module
//!
//! Command-line offline host for the GainKnob processor.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GainKnob - gain/saturation with EQ boost, offline host
#[derive(Parser, Debug)]
#[command(name = "gainknob")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a WAV file through the effect
    #[command(name = "render")]
    Render {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (32-bit float)
        output: PathBuf,

        /// Linear gain multiplier (0-10)
        #[arg(short, long)]
        gain: Option<f32>,

        /// Gain knob position in dB (0-10), mapped to a linear multiplier
        #[arg(long, conflicts_with = "gain")]
        gain_db: Option<f32>,

        /// EQ boost at 400 Hz in dB (0-10)
        #[arg(short, long)]
        eq_boost: Option<f32>,

        /// Frames per processing block
        #[arg(short, long, default_value_t = 512)]
        block_size: usize,

        /// Load parameter values from a saved state file
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Print the editor view after rendering
        #[arg(long)]
        show: bool,

        /// Poll meters and waveform at the editor refresh rate while rendering
        #[arg(long)]
        monitor: bool,
    },

    /// Write a sine test tone
    #[command(name = "tone")]
    Tone {
        /// Output WAV file
        output: PathBuf,

        /// Frequency in Hz
        #[arg(short, long, default_value_t = 400.0)]
        frequency: f32,

        /// Duration in seconds
        #[arg(short, long, default_value_t = 1.0)]
        duration: f32,

        /// Peak amplitude (0-1)
        #[arg(short, long, default_value_t = 0.5)]
        amplitude: f32,

        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,

        #[arg(long, default_value_t = 2)]
        channels: usize,
    },

    /// Print the EQ coefficient set for a sample rate and boost
    #[command(name = "coefficients")]
    Coefficients {
        #[arg(long, default_value_t = 48000.0)]
        sample_rate: f64,

        /// EQ boost in dB
        #[arg(short, long, default_value_t = 0.0)]
        eq_boost: f32,
    },

    /// Write a parameter state file
    #[command(name = "save-state")]
    SaveState {
        /// Destination JSON file
        path: PathBuf,

        #[arg(short, long)]
        gain: Option<f32>,

        #[arg(short, long)]
        eq_boost: Option<f32>,
    },
}
