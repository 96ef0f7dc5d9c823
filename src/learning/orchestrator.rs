//! Five-phase learning run: collect, consolidate, approve, apply, calibrate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LearningConfig;
use crate::error::Result;
use crate::suggestions::{SourceRegistry, SourceRequest, Suggestion, SuggestionCategory};

use super::applicator::{Applicator, ApplyResult};
use super::approval::{ApprovalIo, ApprovalOutcome, ApprovalState, ApprovalWorkflow};
use super::calibrator::{ControllerAction, ThresholdCalibrator};
use super::rejections::RejectionMemory;
use super::report::LearningReport;

/// Operator overrides for the calibrated detection thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdOverrides {
    pub min_occurrences: Option<u32>,
    pub confidence_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub interactive: bool,
    /// Restrict the run to these categories; empty means every enabled one.
    pub category_filter: Vec<SuggestionCategory>,
    pub dry_run: bool,
    pub overrides: ThresholdOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "action", rename_all = "snake_case")]
pub enum CalibrationStatus {
    Disabled,
    Recorded(ControllerAction),
    /// Stepped in memory but the state file was not written.
    Failed(ControllerAction),
    DryRun(ControllerAction),
}

/// Per-phase counts; always complete, even under partial degradation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub degraded_categories: Vec<SuggestionCategory>,
    pub collected: usize,
    pub approved: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub apply_confirmed: bool,
    pub applied_ok: usize,
    pub applied_failed: usize,
    pub calibration: CalibrationStatus,
    pub terminal: Option<ApprovalState>,
    pub dry_run: bool,
    pub warnings: Vec<String>,
}

impl RunSummary {
    fn new(dry_run: bool) -> Self {
        Self {
            sources_ok: 0,
            sources_failed: 0,
            degraded_categories: Vec::new(),
            collected: 0,
            approved: 0,
            rejected: 0,
            skipped: 0,
            apply_confirmed: false,
            applied_ok: 0,
            applied_failed: 0,
            calibration: CalibrationStatus::Disabled,
            terminal: None,
            dry_run,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub report: LearningReport,
    pub summary: RunSummary,
    pub approval: Option<ApprovalOutcome>,
    pub applied: Option<ApplyResult>,
}

impl RunOutcome {
    /// The operator ended approval early with Quit or an interrupt.
    #[must_use]
    pub const fn cancelled(&self) -> bool {
        matches!(
            self.summary.terminal,
            Some(ApprovalState::Quit | ApprovalState::Interrupted)
        )
    }

    #[must_use]
    pub const fn interrupted(&self) -> bool {
        matches!(self.summary.terminal, Some(ApprovalState::Interrupted))
    }
}

pub struct Orchestrator {
    config: LearningConfig,
    sources: SourceRegistry,
    rejections: Arc<RejectionMemory>,
    calibrator: ThresholdCalibrator,
    applicator: Applicator,
    project_context: String,
}

impl Orchestrator {
    pub fn new(
        config: LearningConfig,
        sources: SourceRegistry,
        rejections: Arc<RejectionMemory>,
        calibrator: ThresholdCalibrator,
        applicator: Applicator,
        project_context: impl Into<String>,
    ) -> Self {
        Self {
            config,
            sources,
            rejections,
            calibrator,
            applicator,
            project_context: project_context.into(),
        }
    }

    #[must_use]
    pub const fn calibrator(&self) -> &ThresholdCalibrator {
        &self.calibrator
    }

    /// Execute one run. Category-local failures degrade; nothing here aborts
    /// the run except a bug in the caller's wiring.
    pub fn run(&mut self, options: &RunOptions, io: &mut dyn ApprovalIo) -> Result<RunOutcome> {
        let mut summary = RunSummary::new(options.dry_run);
        if let Some(message) = self.calibrator.take_load_warning() {
            summary.warnings.push(message);
        }

        let collected = self.collect(options, &mut summary);

        let report = LearningReport::consolidate(
            collected,
            self.config.max_suggestions_per_category,
            self.calibrator.health_metrics(),
        );
        summary.collected = report.total_suggestions;
        debug!(
            run_id = %report.run_id,
            total = report.total_suggestions,
            impact = %report.estimated_impact_summary,
            "report consolidated"
        );

        let approval = if options.interactive && !report.is_empty() {
            let pending: Vec<Suggestion> = report.suggestions().cloned().collect();
            let workflow = ApprovalWorkflow::new(&self.rejections, self.project_context.clone());
            let outcome = workflow.run(&pending, io);
            summary.approved = outcome.approved.len();
            summary.rejected = outcome.rejected_count();
            summary.skipped = outcome.unresolved.len();
            summary.terminal = Some(outcome.terminal);
            summary.warnings.extend(outcome.warnings.iter().cloned());
            debug!(
                approved = summary.approved,
                rejected = summary.rejected,
                skipped = summary.skipped,
                terminal = ?outcome.terminal,
                "approval finished"
            );
            Some(outcome)
        } else {
            debug!(
                interactive = options.interactive,
                empty = report.is_empty(),
                "approval skipped"
            );
            None
        };

        let applied = match &approval {
            Some(outcome) if !outcome.approved.is_empty() => {
                self.apply(&outcome.approved, options, io, &mut summary)
            }
            _ => None,
        };

        if self.config.meta_learning {
            self.calibrate(report.total_suggestions, summary.approved, options, &mut summary);
        }

        info!(
            collected = summary.collected,
            approved = summary.approved,
            rejected = summary.rejected,
            applied = summary.applied_ok,
            failed = summary.applied_failed,
            warnings = summary.warnings.len(),
            "learning run complete"
        );

        Ok(RunOutcome {
            report,
            summary,
            approval,
            applied,
        })
    }

    fn enabled_categories(&self, options: &RunOptions) -> Vec<SuggestionCategory> {
        SuggestionCategory::all()
            .iter()
            .copied()
            .filter(|c| self.config.categories.contains(c))
            .filter(|c| options.category_filter.is_empty() || options.category_filter.contains(c))
            .collect()
    }

    fn collect(
        &self,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) -> BTreeMap<SuggestionCategory, Vec<Suggestion>> {
        let mut collected = BTreeMap::new();

        for category in self.enabled_categories(options) {
            let Some(source) = self.sources.get(category) else {
                debug!(%category, "no source registered");
                continue;
            };
            let thresholds = self.calibrator.thresholds(category);
            let request = SourceRequest {
                window_days: self.config.analysis_window_days,
                max_results: self.config.max_suggestions_per_category,
                min_occurrences: options
                    .overrides
                    .min_occurrences
                    .unwrap_or(thresholds.min_occurrences),
                confidence_threshold: options
                    .overrides
                    .confidence_threshold
                    .unwrap_or(thresholds.confidence_threshold)
                    .clamp(0.0, 1.0),
            };

            match source.generate(&request) {
                Ok(items) => {
                    debug!(%category, count = items.len(), "source collected");
                    summary.sources_ok += 1;
                    collected.insert(category, items);
                }
                Err(err) => {
                    warn!(%category, error = %err, "source failed; category degraded");
                    summary.sources_failed += 1;
                    summary.degraded_categories.push(category);
                    collected.insert(category, Vec::new());
                }
            }
        }

        collected
    }

    fn apply(
        &mut self,
        approved: &[Suggestion],
        options: &RunOptions,
        io: &mut dyn ApprovalIo,
        summary: &mut RunSummary,
    ) -> Option<ApplyResult> {
        let confirmed = io.confirm_apply(approved).unwrap_or_else(|err| {
            summary
                .warnings
                .push(format!("apply confirmation aborted: {err}"));
            false
        });
        summary.apply_confirmed = confirmed;
        if !confirmed {
            info!(pending = approved.len(), "apply declined");
            return None;
        }

        self.applicator.set_dry_run(options.dry_run);
        let result = self.applicator.apply(approved);
        summary.applied_ok = result.succeeded.len();
        summary.applied_failed = result.failed.len();
        summary.warnings.extend(result.errors.iter().cloned());
        Some(result)
    }

    fn calibrate(
        &mut self,
        total: usize,
        accepted: usize,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) {
        if options.dry_run {
            let action = self.calibrator.observe(total, accepted);
            summary.calibration = CalibrationStatus::DryRun(action);
            return;
        }
        summary.calibration = match self.calibrator.record_outcome(total, accepted) {
            Ok(action) => CalibrationStatus::Recorded(action),
            Err(err) => {
                warn!(path = %self.calibrator.path().display(), error = %err, "threshold state not saved");
                summary
                    .warnings
                    .push(format!("threshold state not saved: {err}"));
                CalibrationStatus::Failed(self.calibrator.evaluate())
            }
        };
    }
}
