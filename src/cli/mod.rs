//! Command-line surface of config-learn.

use std::path::PathBuf;

use clap::Parser;

pub mod colors;
pub mod commands;
pub mod console;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "config-learn",
    version,
    about = "Learn assistant-configuration improvements from usage and apply the ones you approve"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit JSON on stdout for agents and scripts
    #[arg(long, global = true)]
    pub robot: bool,

    /// Use this config file instead of the global and project files
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
