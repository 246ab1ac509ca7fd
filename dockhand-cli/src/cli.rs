//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::util::parse_timestamp;

/// `Dockhand` command-line interface for the dashboard core
#[derive(Parser)]
#[command(name = "dockhand")]
#[command(author, version, about = "Dockhand command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "DOCKHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List configured servers
    #[command(about = "List servers from the inventory")]
    Servers,

    /// Run a command on a server
    #[command(about = "Run a command on a server through the connection pool")]
    Exec {
        /// Server name from the inventory
        server: String,

        /// Command to run remotely
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Collect metrics from a server
    #[command(about = "Collect metrics from a server through the TTL cache")]
    Metrics {
        /// Server name from the inventory
        server: String,

        /// Metric family to collect
        #[arg(short, long, default_value = "system", value_enum)]
        kind: MetricKind,

        /// Container name, required for --kind service
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Sample metrics repeatedly and print the recorded series
    #[command(about = "Sample system metrics over time and print the series")]
    History {
        /// Server name from the inventory
        server: String,

        /// Number of samples to collect
        #[arg(short = 'n', long, default_value = "5")]
        samples: usize,

        /// Seconds between samples
        #[arg(short, long, default_value = "10")]
        interval: u64,

        /// Only print samples at or after this RFC 3339 timestamp
        #[arg(long, value_parser = parse_timestamp)]
        since: Option<DateTime<Utc>>,

        /// Only print samples at or before this RFC 3339 timestamp
        #[arg(long, value_parser = parse_timestamp)]
        until: Option<DateTime<Utc>>,
    },
}

/// Metric families the collector understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricKind {
    /// CPU, memory, disk, and load via standard shell tools
    System,
    /// Per-container stats plus engine-wide counters
    Docker,
    /// Stats for a single container
    Service,
}
