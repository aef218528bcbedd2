//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Framelock - frame-capture phase-locked loop
#[derive(Parser, Debug)]
#[command(
    name = "framelock",
    author,
    version,
    about = "Frame-capture phase-locked loop with strobe trigger scheduling",
    long_about = "Locks a host-side phase model onto a camera's frame-capture cadence.\n\n\
                  Measures the device-to-host clock offset, converges a period and phase\n\
                  model from frame-arrival events, and schedules strobe trigger deadlines\n\
                  in bounded-error phase relationship with the exposures."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FRAMELOCK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FRAMELOCK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the lock loop against a mock camera
    Run(RunArgs),

    /// Validate settings file without running
    Validate(ValidateArgs),

    /// Display settings information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to settings file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "FRAMELOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mock camera frame rate in Hz (also sets the nominal period)
    #[arg(long, default_value = "30.0", env = "FRAMELOCK_FRAME_RATE")]
    pub frame_rate: f64,

    /// Simulated device-minus-host clock skew in microseconds
    #[arg(long, default_value = "-250000", env = "FRAMELOCK_DEVICE_SKEW_US")]
    pub device_skew_us: i64,

    /// Alternating frame timing jitter in microseconds
    #[arg(long, default_value = "0")]
    pub jitter_us: i64,

    /// Drop every n-th mock frame (0 = no drops)
    #[arg(long, default_value = "0")]
    pub drop_every: u64,

    /// Override trigger lead time in microseconds (negative fires early)
    #[arg(long, env = "FRAMELOCK_LEAD_TIME_US")]
    pub lead_time_us: Option<i64>,

    /// Maximum number of frame events to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "FRAMELOCK_MAX_EVENTS")]
    pub max_events: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FRAMELOCK_TIMEOUT")]
    pub timeout: u64,

    /// Validate settings and exit without running the loop
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the frame event queue
    #[arg(long, default_value = "100", env = "FRAMELOCK_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "FRAMELOCK_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to settings file to validate
    #[arg(short, long, default_value = "framelock.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to settings file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
