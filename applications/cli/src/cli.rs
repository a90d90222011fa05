//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tonal")]
#[command(version, about = "Conditional loudness normalization of audio files", long_about = None)]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error, critical or off
    #[arg(long, global = true, default_value = "info")]
    pub loglevel: String,

    /// TOML file overriding the normalization target
    #[arg(long, global = true, value_name = "TOML")]
    pub target: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a file if it is off target (exit 0 written, 2 unchanged)
    An {
        /// Source audio file
        #[arg(short, long)]
        src: PathBuf,
        /// Destination WAV file
        #[arg(short, long)]
        dst: PathBuf,
        /// Seconds of silence to pad (positive) or audio to trim (negative)
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
    },
    /// Check that a file contains a readable audio stream
    Ai {
        /// File to check
        #[arg(short, long)]
        src: PathBuf,
    },
    /// Print stream description and loudness as JSON
    Am {
        /// File to measure
        #[arg(short, long)]
        src: PathBuf,
    },
}
