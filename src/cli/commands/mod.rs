//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod rejections;
pub mod run;
pub mod thresholds;

use crate::app::AppContext;
use crate::error::Result;

/// How the process should exit after a command finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Approval was interrupted by Ctrl-C or end of input.
    Interrupted,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect, review and apply suggestions, then recalibrate thresholds
    Run(run::RunArgs),

    /// Inspect or compact the rejection log
    Rejections(rejections::RejectionsArgs),

    /// Inspect or reset calibrated detection thresholds
    Thresholds(thresholds::ThresholdsArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<CommandStatus> {
    match command {
        Commands::Run(args) => run::run(ctx, args),
        Commands::Rejections(args) => rejections::run(ctx, args).map(|()| CommandStatus::Success),
        Commands::Thresholds(args) => thresholds::run(ctx, args).map(|()| CommandStatus::Success),
    }
}
