//! config-learn run - one full learning pass

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::colors::{ColorSupport, LearnStyles, format_category, format_status, styled};
use crate::cli::commands::CommandStatus;
use crate::cli::console::{ConsoleIo, HeadlessIo};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, robot_partial};
use crate::error::{LearnError, Result};
use crate::learning::{
    Applicator, ApprovalIo, CalibrationStatus, Orchestrator, ProjectLayout, RunOptions,
    RunOutcome, ThresholdOverrides, default_handlers,
};
use crate::suggestions::{CandidateFileSource, SourceRegistry, SuggestionCategory};
use crate::utils::format_percent;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Collect and calibrate without prompting
    #[arg(long)]
    pub non_interactive: bool,

    /// Show what would be applied without writing project files or thresholds
    #[arg(long)]
    pub dry_run: bool,

    /// Override the calibrated minimum occurrence count
    #[arg(long, value_name = "N")]
    pub min_occurrences: Option<u32>,

    /// Override the calibrated confidence threshold (0.0-1.0)
    #[arg(long, value_name = "X")]
    pub confidence_threshold: Option<f64>,

    /// Analysis window in days
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Maximum suggestions kept per category
    #[arg(long, value_name = "N")]
    pub max_per_category: Option<usize>,

    /// Do not record this run's outcome or adjust thresholds
    #[arg(long)]
    pub no_meta_learning: bool,

    /// Only collect these categories (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<SuggestionCategory>,

    /// Project whose configuration receives applied changes
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<CommandStatus> {
    if let Some(value) = args.confidence_threshold {
        if !(0.0..=1.0).contains(&value) {
            return Err(LearnError::Config(format!(
                "--confidence-threshold {value} outside [0, 1]"
            )));
        }
    }

    let mut learning = ctx.config.learning.clone();
    if let Some(days) = args.days {
        learning.analysis_window_days = days;
    }
    if let Some(max) = args.max_per_category {
        learning.max_suggestions_per_category = max.max(1);
    }
    if args.no_meta_learning {
        learning.meta_learning = false;
    }

    let project = match &args.project {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let layout = ProjectLayout::new(&project);
    let memory = ctx.rejection_memory();

    let mut sources = SourceRegistry::new();
    for category in SuggestionCategory::all() {
        sources.register(Box::new(CandidateFileSource::in_dir(
            &ctx.paths.candidates_dir,
            *category,
        )));
    }
    if learning.filter_rejected {
        sources = sources.filtered_by(&memory);
    }

    let mut orchestrator = Orchestrator::new(
        learning,
        sources,
        memory,
        ctx.calibrator(),
        Applicator::new(args.dry_run).with_handlers(default_handlers(&layout)),
        project.display().to_string(),
    );

    let options = RunOptions {
        interactive: !args.non_interactive,
        category_filter: args.categories.clone(),
        dry_run: args.dry_run,
        overrides: ThresholdOverrides {
            min_occurrences: args.min_occurrences,
            confidence_threshold: args.confidence_threshold,
        },
    };
    debug!(?options, project = %project.display(), "starting learning run");

    let mut io: Box<dyn ApprovalIo> = if options.interactive {
        Box::new(ConsoleIo::start()?)
    } else {
        Box::new(HeadlessIo)
    };
    let outcome = orchestrator.run(&options, io.as_mut())?;

    if ctx.robot_mode {
        emit_robot(&outcome)?;
    } else {
        emit_human(render(&outcome, ColorSupport::detect()));
    }

    Ok(if outcome.interrupted() {
        CommandStatus::Interrupted
    } else {
        CommandStatus::Success
    })
}

fn emit_robot(outcome: &RunOutcome) -> Result<()> {
    let summary = &outcome.summary;
    let failed = summary.sources_failed + summary.applied_failed;
    let response = if failed == 0 {
        robot_ok(outcome)
    } else {
        robot_partial(outcome, summary.sources_ok + summary.applied_ok, failed)
    };
    emit_json(&response.with_warnings(summary.warnings.clone()))
}

fn render(outcome: &RunOutcome, support: ColorSupport) -> HumanLayout {
    let report = &outcome.report;
    let summary = &outcome.summary;
    let mut layout = HumanLayout::new();

    layout.blank().title("Learning report");
    layout.paragraph(&report.estimated_impact_summary, 0).blank();
    for (category, items) in &report.suggestions_by_category {
        if items.is_empty() {
            continue;
        }
        layout.kv(&format_category(*category, support), &items.len().to_string());
    }
    if let Some(health) = report.meta_insights.get("system_health") {
        layout.kv("System health", &format_percent(*health));
    }

    layout.blank().section("Summary");
    layout
        .kv(
            "Sources",
            &format!("{} ok, {} failed", summary.sources_ok, summary.sources_failed),
        )
        .kv("Collected", &summary.collected.to_string());
    if outcome.approval.is_some() {
        layout.kv(
            "Decisions",
            &format!(
                "{} approved, {} rejected, {} skipped",
                summary.approved, summary.rejected, summary.skipped
            ),
        );
    }
    if let Some(applied) = &outcome.applied {
        let verb = if summary.dry_run { "Would apply" } else { "Applied" };
        layout.kv(
            verb,
            &format!("{} ok, {} failed", summary.applied_ok, summary.applied_failed),
        );
        for item in &applied.succeeded {
            layout.push_line(format!("  {} {}", format_status(Some(true), support), item.detail));
        }
        for item in &applied.failed {
            layout.push_line(format!("  {} {}", format_status(Some(false), support), item.error));
        }
    } else if summary.approved > 0 && !summary.apply_confirmed {
        layout.kv("Applied", "nothing (not confirmed)");
    }
    layout.kv("Calibration", &calibration_label(summary.calibration));

    if outcome.interrupted() {
        layout.blank().push_line(styled(
            "Interrupted; approvals so far were kept",
            LearnStyles::warning,
            support,
        ));
    }
    if !summary.warnings.is_empty() {
        layout.blank().section("Warnings");
        for warning in &summary.warnings {
            layout.push_line(format!("{} {warning}", format_status(None, support)));
        }
    }
    layout
}

fn calibration_label(status: CalibrationStatus) -> String {
    match status {
        CalibrationStatus::Disabled => "disabled".to_string(),
        CalibrationStatus::Recorded(action) => format!("recorded ({action:?})").to_lowercase(),
        CalibrationStatus::Failed(action) => {
            format!("not saved ({action:?})").to_lowercase()
        }
        CalibrationStatus::DryRun(action) => format!("dry run ({action:?})").to_lowercase(),
    }
}
