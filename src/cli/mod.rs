//! Command-line interface definitions.

pub mod check;
pub mod markets;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Twinleg - Yes/No complement arbitrage for binary prediction markets.
#[derive(Parser, Debug)]
#[command(name = "twinleg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor markets and execute arbitrage (foreground)
    ///
    /// Markets halted after an unresolved one-sided fill stay halted only
    /// for the current process; restarting clears every halt.
    Run(RunArgs),

    /// List discovered binary markets
    Markets(MarketsArgs),

    /// Validate a configuration file
    Check(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Simulate fills instead of sending orders
    #[arg(long)]
    pub dry_run: bool,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `markets` subcommand.
#[derive(Parser, Debug)]
pub struct MarketsArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Maximum number of markets to list
    #[arg(short, long)]
    pub limit: Option<usize>,
}
