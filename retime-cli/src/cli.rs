// retime-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use retime_core::{OutputFormat, ProbeStrategy};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Retime: re-encode videos at a different playback speed",
    long_about = "Speeds up or slows down a video by re-encoding it with ffmpeg, \
                  showing progress and allowing the encode to be interrupted."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// ffmpeg binary to run
    #[arg(long, global = true, value_name = "PATH", env = "RETIME_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary used for probing
    #[arg(long, global = true, value_name = "PATH", env = "RETIME_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// How input metadata is read: ffprobe or decode
    #[arg(long, global = true, value_name = "STRATEGY", env = "RETIME_PROBE_STRATEGY")]
    pub probe_strategy: Option<ProbeStrategy>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shows the metadata of an input video
    Probe(ProbeArgs),
    /// Re-encodes a video at an altered playback speed
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file
    #[arg(required = true, value_name = "INPUT")]
    pub input: PathBuf,

    /// Print the metadata as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input video file
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <INPUT stem>.<SPEED>.mp4 beside the input)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Playback speed multiplier; 2.0 plays twice as fast
    #[arg(short = 's', long, default_value_t = 2.0, value_parser = parse_speed)]
    pub speed: f64,

    /// Output format
    #[arg(short = 'f', long, default_value = "mp4", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Interrupt the encode after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub stop_after: Option<f64>,

    /// Print progress as JSON lines instead of a progress bar
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// The output path, derived from the input when not given.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            self.input
                .with_extension(format!("{:?}.{}", self.speed, self.format.extension()))
        })
    }
}

fn parse_speed(raw: &str) -> Result<f64, String> {
    let speed: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be greater than zero, got {raw}"))
    }
}

fn parse_seconds(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(format!("expected a non-negative number of seconds, got {raw}"))
    }
}
