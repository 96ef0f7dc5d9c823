//! Threshold calibration from acceptance history.
//!
//! A bounded bang-bang controller: when operators accept nearly everything the
//! detectors are too conservative and thresholds step down; when they reject
//! most of it thresholds step up. Each step is fixed and clamped, so identical
//! history always yields the identical decision. The effect compounds across
//! runs only because [`ThresholdState`] is persisted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CalibrationConfig;
use crate::error::Result;
use crate::suggestions::SuggestionCategory;

use super::threshold_storage;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdParameter {
    MinOccurrences,
    ConfidenceThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    pub min_occurrences: u32,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub timestamp: DateTime<Utc>,
    pub total_suggestions: usize,
    pub accepted_count: usize,
    pub acceptance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdState {
    pub version: u32,
    pub categories: BTreeMap<SuggestionCategory, CategoryThresholds>,
    #[serde(default)]
    pub history: Vec<OutcomeRecord>,
}

impl ThresholdState {
    #[must_use]
    pub fn with_defaults(defaults: CategoryThresholds) -> Self {
        Self {
            version: STATE_VERSION,
            categories: SuggestionCategory::all()
                .iter()
                .map(|c| (*c, defaults))
                .collect(),
            history: Vec::new(),
        }
    }
}

/// Direction the controller moved the thresholds after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerAction {
    Lowered,
    Raised,
    Held,
}

/// Acceptance rate of one run; zero suggestions count as full acceptance.
#[must_use]
pub fn acceptance_rate(total_suggestions: usize, accepted_count: usize) -> f64 {
    if total_suggestions == 0 {
        return 1.0;
    }
    accepted_count.min(total_suggestions) as f64 / total_suggestions as f64
}

pub struct ThresholdCalibrator {
    path: PathBuf,
    config: CalibrationConfig,
    defaults: CategoryThresholds,
    state: ThresholdState,
    load_warning: Option<String>,
}

impl ThresholdCalibrator {
    /// Load persisted state, falling back to `defaults` when it is missing or
    /// unreadable.
    pub fn open(
        path: impl Into<PathBuf>,
        config: CalibrationConfig,
        defaults: CategoryThresholds,
    ) -> Self {
        let path = path.into();
        let (state, load_warning) = match threshold_storage::load_state(&path) {
            Ok(Some(state)) => (state, None),
            Ok(None) => (ThresholdState::with_defaults(defaults), None),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "threshold state unreadable; using defaults");
                (
                    ThresholdState::with_defaults(defaults),
                    Some(format!(
                        "threshold state at {} was unreadable ({err}); started from defaults",
                        path.display()
                    )),
                )
            }
        };
        let mut calibrator = Self {
            path,
            config,
            defaults,
            state,
            load_warning,
        };
        calibrator.normalize();
        calibrator
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn state(&self) -> &ThresholdState {
        &self.state
    }

    pub fn take_load_warning(&mut self) -> Option<String> {
        self.load_warning.take()
    }

    #[must_use]
    pub fn thresholds(&self, category: SuggestionCategory) -> CategoryThresholds {
        self.state
            .categories
            .get(&category)
            .copied()
            .unwrap_or(self.defaults)
    }

    #[must_use]
    pub fn adjusted(&self, category: SuggestionCategory, parameter: ThresholdParameter) -> f64 {
        let thresholds = self.thresholds(category);
        match parameter {
            ThresholdParameter::MinOccurrences => f64::from(thresholds.min_occurrences),
            ThresholdParameter::ConfidenceThreshold => thresholds.confidence_threshold,
        }
    }

    /// Append a run outcome, step the thresholds, and persist.
    ///
    /// The in-memory state is updated even when the write fails.
    pub fn record_outcome(
        &mut self,
        total_suggestions: usize,
        accepted_count: usize,
    ) -> Result<ControllerAction> {
        let action = self.observe(total_suggestions, accepted_count);
        self.save()?;
        Ok(action)
    }

    /// Same as [`Self::record_outcome`] without touching disk.
    pub fn observe(&mut self, total_suggestions: usize, accepted_count: usize) -> ControllerAction {
        self.state.history.push(OutcomeRecord {
            timestamp: Utc::now(),
            total_suggestions,
            accepted_count: accepted_count.min(total_suggestions),
            acceptance_rate: acceptance_rate(total_suggestions, accepted_count),
        });
        let limit = self.config.history_limit.max(1);
        if self.state.history.len() > limit {
            let excess = self.state.history.len() - limit;
            self.state.history.drain(..excess);
        }

        let action = self.evaluate();
        self.step(action);
        info!(
            total_suggestions,
            accepted_count,
            ?action,
            "calibration outcome recorded"
        );
        action
    }

    /// Controller decision for the current history.
    #[must_use]
    pub fn evaluate(&self) -> ControllerAction {
        if self.state.history.len() < self.config.min_runs.max(1) {
            return ControllerAction::Held;
        }
        let rate = self.rolling_rate();
        if rate > self.config.high_water {
            ControllerAction::Lowered
        } else if rate < self.config.low_water {
            ControllerAction::Raised
        } else {
            ControllerAction::Held
        }
    }

    /// Mean acceptance rate over the rolling window; 1.0 with no history.
    #[must_use]
    pub fn rolling_rate(&self) -> f64 {
        let window = self.config.rolling_window.max(1);
        let recent: Vec<f64> = self
            .state
            .history
            .iter()
            .rev()
            .take(window)
            .map(|r| r.acceptance_rate)
            .collect();
        if recent.is_empty() {
            return 1.0;
        }
        recent.iter().sum::<f64>() / recent.len() as f64
    }

    #[must_use]
    pub fn health_metrics(&self) -> BTreeMap<String, f64> {
        let rate = self.rolling_rate().clamp(0.0, 1.0);
        let mut metrics = BTreeMap::new();
        metrics.insert("system_health".to_string(), rate);
        metrics.insert("recent_acceptance_rate".to_string(), rate);
        metrics.insert(
            "runs_recorded".to_string(),
            self.state.history.len() as f64,
        );
        for (category, thresholds) in &self.state.categories {
            metrics.insert(
                format!("{category}.min_occurrences"),
                f64::from(thresholds.min_occurrences),
            );
            metrics.insert(
                format!("{category}.confidence_threshold"),
                thresholds.confidence_threshold,
            );
        }
        metrics
    }

    /// Forget history and restore default thresholds.
    pub fn reset(&mut self) -> Result<()> {
        self.state = ThresholdState::with_defaults(self.defaults);
        self.normalize();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        threshold_storage::save_state(&self.path, &self.state)
    }

    fn step(&mut self, action: ControllerAction) {
        let cfg = &self.config;
        for thresholds in self.state.categories.values_mut() {
            match action {
                ControllerAction::Lowered => {
                    thresholds.min_occurrences =
                        thresholds.min_occurrences.saturating_sub(cfg.occurrence_step);
                    thresholds.confidence_threshold -= cfg.confidence_step;
                }
                ControllerAction::Raised => {
                    thresholds.min_occurrences =
                        thresholds.min_occurrences.saturating_add(cfg.occurrence_step);
                    thresholds.confidence_threshold += cfg.confidence_step;
                }
                ControllerAction::Held => {}
            }
            *thresholds = clamp_thresholds(*thresholds, cfg);
        }
    }

    /// Bring loaded or default values inside the configured bounds and make
    /// sure every category has an entry.
    fn normalize(&mut self) {
        for category in SuggestionCategory::all() {
            self.state
                .categories
                .entry(*category)
                .or_insert(self.defaults);
        }
        self.step(ControllerAction::Held);
        let limit = self.config.history_limit.max(1);
        if self.state.history.len() > limit {
            let excess = self.state.history.len() - limit;
            self.state.history.drain(..excess);
        }
    }
}

fn clamp_thresholds(thresholds: CategoryThresholds, cfg: &CalibrationConfig) -> CategoryThresholds {
    let occ_ceiling = cfg.min_occurrences_ceiling.max(cfg.min_occurrences_floor);
    let conf_ceiling = cfg.confidence_ceiling.max(cfg.confidence_floor);
    CategoryThresholds {
        min_occurrences: thresholds
            .min_occurrences
            .clamp(cfg.min_occurrences_floor, occ_ceiling),
        confidence_threshold: thresholds
            .confidence_threshold
            .clamp(cfg.confidence_floor, conf_ceiling)
            .clamp(0.0, 1.0),
    }
}
