//! goatsynth CLI: song info, headless playback and WAV export.
//!
//! Usage:
//!   gs-cli info song.gts
//!   gs-cli play song.gts --subtune 1
//!   gs-cli render song.gts -o out.wav --seconds 120 --loops 2

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gs_master::{Controller, RenderConfig, SAMPLE_RATE};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Player for GTS5 chip-music songs
#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the song header and table sizes
    Info {
        song: PathBuf,
    },

    /// Play a subtune on the default audio device
    Play {
        song: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        subtune: usize,
    },

    /// Render a subtune to a mono 8-bit 16 kHz WAV file
    Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    song: PathBuf,

    /// Output path
    #[arg(short, long)]
    output: PathBuf,

    #[arg(short, long, default_value_t = 0)]
    subtune: usize,

    /// Maximum length in seconds
    #[arg(long, default_value_t = 300)]
    seconds: u32,

    /// Stop after the song has ended this many times
    #[arg(long, default_value_t = 1)]
    loops: u32,
}

impl RenderArgs {
    fn config(&self) -> RenderConfig {
        RenderConfig {
            subtune: self.subtune,
            max_seconds: self.seconds,
            loops: self.loops,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { song } => {
            let ctrl = load(&song)?;
            if let Some(info) = ctrl.info() {
                print!("{info}");
            }
        }
        Commands::Play { song, subtune } => play(&mut load(&song)?, subtune)?,
        Commands::Render(args) => render(&load(&args.song)?, &args)?,
    }

    Ok(())
}

fn load(path: &Path) -> Result<Controller> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read song");
    let mut ctrl = Controller::new();
    ctrl.load(&data)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(ctrl)
}

fn play(ctrl: &mut Controller, subtune: usize) -> Result<()> {
    ctrl.play(subtune)
        .with_context(|| format!("failed to play subtune {subtune}"))?;
    println!("Playing subtune {subtune}...");

    while ctrl.is_playing() {
        let seconds = ctrl.samples_played() / SAMPLE_RATE as u64;
        print!("\r{:02}:{:02}", seconds / 60, seconds % 60);
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(50));
    }

    println!("\rDone.          ");
    Ok(())
}

fn render(ctrl: &Controller, args: &RenderArgs) -> Result<()> {
    let config = args.config();
    println!("Rendering subtune {} to {}...", config.subtune, args.output.display());

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut out = ctrl
        .render_wav(&config, BufWriter::new(file))
        .context("render failed")?;
    out.flush()
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let bytes = fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    println!("Wrote {bytes} bytes");
    Ok(())
}
