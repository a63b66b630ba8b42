use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ripple-tally",
    version,
    about = "Write-buffered interaction counters drained into durable statistics",
    long_about = "Records likes, shares, comments, replies, geo-tagged hits and post views \
                 into fast in-memory counters and periodically drains them into \
                 time-series tables."
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the drain scheduler until interrupted
    Start {
        /// Seconds between drains (overrides config file if provided)
        #[arg(long)]
        interval: Option<u64>,

        /// Skip applying pending migrations on startup
        #[arg(long)]
        no_migrate: bool,
    },

    /// Run one drain tick and exit
    Drain {
        /// Print the tick report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Database management commands
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate the configuration file (or defaults plus environment)
    Validate {
        /// Show effective configuration
        #[arg(long)]
        show: bool,
    },

    /// Generate example configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "ripple-tally.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatabaseCommands {
    /// Apply all pending migrations
    Migrate,

    /// Check connectivity and pending migrations
    Status,
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
