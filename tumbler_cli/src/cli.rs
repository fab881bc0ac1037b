//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tumbler", version, about = "Tumbling chamber dissociation controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/tumbler.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the timed dissociation cycle until Ctrl-C
    Run {
        /// Output CSV; defaults to output.datafile from the config
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Stop after this many readings
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        max_samples: Option<u64>,
    },
    /// Flip the chamber back and forth, blink the lamp, take one reading
    SelfTest {
        /// Round trips to perform
        #[arg(long, default_value_t = 2)]
        rotations: u32,
    },
    /// Move the chamber to the load position
    Load,
    /// Move the chamber to the eject (measurement) position
    Eject,
    /// Measure operator-labeled samples one at a time
    Manual {
        /// Output CSV with columns label,intensity
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },
    /// Take a single reading into a new file
    Measure {
        /// Output CSV; must not exist yet
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
