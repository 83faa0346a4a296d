//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pkt Dumper - name and dump packets through a dumper node
#[derive(Parser, Debug)]
#[command(
    name = "pkt-dumper",
    author,
    version,
    about = "Dump packets to templated destinations",
    long_about = "Feeds input files through a packet dumper node.\n\n\
                  Every input file is cut into fixed-size packets, each packet is named \n\
                  from the configured pattern and handed to the configured dump strategy."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PKT_DUMPER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PKT_DUMPER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump the packets of one or more input files
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "dumper.toml", env = "PKT_DUMPER_CONFIG")]
    pub config: PathBuf,

    /// Input files; the position of a file is its stream index
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Packet size in bytes
    #[arg(long, default_value = "4096", env = "PKT_DUMPER_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Exposed to the naming pattern as `outputDir`
    #[arg(short, long, env = "PKT_DUMPER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PKT_DUMPER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Seconds to wait for queued packets (0 = no timeout)
    #[arg(long, default_value = "30", env = "PKT_DUMPER_TIMEOUT")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dumper.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
