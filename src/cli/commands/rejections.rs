//! config-learn rejections - inspect and compact the rejection log

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::colors::{ColorSupport, format_category};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::learning::{CompactionStats, RejectionRecord};
use crate::suggestions::SuggestionCategory;
use crate::utils::{format_age, truncate_string};

#[derive(Args, Debug)]
pub struct RejectionsArgs {
    #[command(subcommand)]
    pub command: RejectionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum RejectionsCommand {
    /// List recent rejections, newest first
    List(ListArgs),

    /// Rewrite the log without entries older than the retention window
    Compact,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Look back this many days (default: retention window)
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Only show this category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<SuggestionCategory>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    log: String,
    window_days: u32,
    records: &'a [RejectionRecord],
}

#[derive(Serialize)]
struct CompactReport {
    log: String,
    retention_days: u32,
    #[serde(flatten)]
    stats: CompactionStats,
}

pub fn run(ctx: &AppContext, args: &RejectionsArgs) -> Result<()> {
    match &args.command {
        RejectionsCommand::List(list) => run_list(ctx, list),
        RejectionsCommand::Compact => run_compact(ctx),
    }
}

fn run_list(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let memory = ctx.rejection_memory();
    let window_days = args.days.unwrap_or_else(|| memory.retention_days());
    let records = memory.recent(window_days, args.category)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(ListReport {
            log: memory.log_path().display().to_string(),
            window_days,
            records: &records,
        }));
    }

    let support = ColorSupport::detect();
    let now = Utc::now();
    let mut layout = HumanLayout::new();
    layout.title(&format!("Rejections in the last {window_days} days"));
    if records.is_empty() {
        layout.push_line("No rejections recorded.");
    }
    for record in &records {
        layout.push_line(format!(
            "{:>10}  {}  {}  {}",
            format_age(record.timestamp, now),
            record.fingerprint,
            format_category(record.category, support),
            truncate_string(&record.project_context, 48),
        ));
    }
    emit_human(layout);
    Ok(())
}

fn run_compact(ctx: &AppContext) -> Result<()> {
    let memory = ctx.rejection_memory();
    let stats = memory.compact()?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(CompactReport {
            log: memory.log_path().display().to_string(),
            retention_days: memory.retention_days(),
            stats,
        }));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Rejection log compacted")
        .kv("Log", &memory.log_path().display().to_string())
        .kv("Kept", &stats.kept.to_string())
        .kv("Removed", &stats.removed.to_string());
    emit_human(layout);
    Ok(())
}
