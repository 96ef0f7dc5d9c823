//! config-learn thresholds - inspect or reset calibrated detection thresholds

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::colors::{ColorSupport, format_category};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::learning::{ControllerAction, ThresholdCalibrator, ThresholdState};
use crate::utils::format_percent;

#[derive(Args, Debug)]
pub struct ThresholdsArgs {
    #[command(subcommand)]
    pub command: ThresholdsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ThresholdsCommand {
    /// Show per-category thresholds and recent acceptance
    Show,

    /// Forget outcome history and restore configured defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Serialize)]
struct ThresholdReport<'a> {
    path: String,
    rolling_acceptance_rate: f64,
    next_action: ControllerAction,
    state: &'a ThresholdState,
}

pub fn run(ctx: &AppContext, args: &ThresholdsArgs) -> Result<()> {
    let mut calibrator = ctx.calibrator();
    match &args.command {
        ThresholdsCommand::Show => show(ctx, &mut calibrator),
        ThresholdsCommand::Reset { yes } => reset(ctx, &mut calibrator, *yes),
    }
}

fn show(ctx: &AppContext, calibrator: &mut ThresholdCalibrator) -> Result<()> {
    let warnings: Vec<String> = calibrator.take_load_warning().into_iter().collect();

    if ctx.robot_mode {
        let report = ThresholdReport {
            path: calibrator.path().display().to_string(),
            rolling_acceptance_rate: calibrator.rolling_rate(),
            next_action: calibrator.evaluate(),
            state: calibrator.state(),
        };
        return emit_json(&robot_ok(report).with_warnings(warnings));
    }

    let support = ColorSupport::detect();
    let state = calibrator.state();
    let mut layout = HumanLayout::new();
    layout
        .title("Detection thresholds")
        .kv("State file", &calibrator.path().display().to_string())
        .kv("Runs recorded", &state.history.len().to_string())
        .kv("Acceptance", &format_percent(calibrator.rolling_rate()))
        .blank();
    for (category, thresholds) in &state.categories {
        layout.kv(
            &format_category(*category, support),
            &format!(
                "min occurrences {}, confidence {:.2}",
                thresholds.min_occurrences, thresholds.confidence_threshold
            ),
        );
    }
    for warning in &warnings {
        layout.blank().push_line(format!("Warning: {warning}"));
    }
    emit_human(layout);
    Ok(())
}

fn reset(ctx: &AppContext, calibrator: &mut ThresholdCalibrator, yes: bool) -> Result<()> {
    if !yes && !ctx.robot_mode && !confirm_reset()? {
        eprintln!("Reset cancelled");
        return Ok(());
    }
    calibrator.reset()?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(ThresholdReport {
            path: calibrator.path().display().to_string(),
            rolling_acceptance_rate: calibrator.rolling_rate(),
            next_action: calibrator.evaluate(),
            state: calibrator.state(),
        }));
    }
    let mut layout = HumanLayout::new();
    layout
        .title("Thresholds reset")
        .kv("State file", &calibrator.path().display().to_string());
    emit_human(layout);
    Ok(())
}

fn confirm_reset() -> Result<bool> {
    use std::io::{self, Write};

    eprint!("Discard calibration history? [y/N] ");
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
