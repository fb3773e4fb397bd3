//! GainKnob CLI - Offline Host
//!
//! Command-line interface for rendering audio through the GainKnob effect.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use gainknob::cli::commands::{self, RenderOptions};
use gainknob::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("{} v{}", gainknob::PLUGIN_NAME, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("{} v{}", gainknob::PLUGIN_NAME, env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            input,
            output,
            gain,
            gain_db,
            eq_boost,
            block_size,
            state,
            show,
            monitor,
        } => {
            let options = RenderOptions {
                gain,
                gain_db,
                eq_boost,
                block_size,
                state: state.as_deref(),
                show,
                monitor,
            };
            commands::render(&input, &output, options)
                .with_context(|| format!("render of {} failed", input.display()))
        }
        Commands::Tone {
            output,
            frequency,
            duration,
            amplitude,
            sample_rate,
            channels,
        } => commands::tone(&output, frequency, duration, amplitude, sample_rate, channels)
            .with_context(|| format!("could not write {}", output.display())),
        Commands::Coefficients {
            sample_rate,
            eq_boost,
        } => commands::coefficients(sample_rate, eq_boost).context("invalid coefficient request"),
        Commands::SaveState {
            path,
            gain,
            eq_boost,
        } => commands::save_state(&path, gain, eq_boost)
            .with_context(|| format!("could not save state to {}", path.display())),
    }
}
