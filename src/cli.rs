//! CLI arguments and subcommands for herakles-sysstats.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-sysstats",
    about = "Host statistics service with per-process CPU/memory usage sampling",
    long_about = "Host statistics service with per-process CPU/memory usage sampling.\n\n\
                  Serves per-process CPU and memory utilization (measured from two \
                  snapshots of kernel tick counters), process state counts, load average \
                  and memory information as JSON rows.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-sysstats — More info: https://www.herakles.now — Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (default: info, or log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Delay between the two process snapshots in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Upper bound for one sampling pass in milliseconds
    #[arg(long)]
    pub sample_timeout_ms: Option<u64>,

    /// Handling of processes that start during the sampling window (suppress | zero_baseline)
    #[arg(long)]
    pub baseline_policy: Option<String>,

    /// Root of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Path to JSON test data file (replays recorded snapshots instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal sysstats_* telemetry at /metrics
    #[arg(long)]
    pub disable_telemetry: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and system requirements
    Check {
        /// Check /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Run one sampling pass
        #[arg(long)]
        sample: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Sample per-process CPU and memory usage once and print the rows
    Sample {
        /// Restrict output to a pid (numeric) or an exact process name
        #[arg(short = 'P', long)]
        process: Option<String>,

        /// Number of sampling passes
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show only the N processes with the highest CPU usage
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
