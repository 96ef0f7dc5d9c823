use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::learning::CategoryThresholds;
use crate::suggestions::SuggestionCategory;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub rejections: RejectionsConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("CONFIG_LEARN_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&root.join("config.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("config-learn/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| LearnError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| LearnError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.learning {
            self.learning.merge(patch);
        }
        if let Some(patch) = patch.rejections {
            self.rejections.merge(patch);
        }
        if let Some(patch) = patch.calibration {
            self.calibration.merge(patch);
        }
        if let Some(patch) = patch.paths {
            self.paths.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_u32("CONFIG_LEARN_WINDOW_DAYS")? {
            self.learning.analysis_window_days = value;
        }
        if let Some(value) = env_u32("CONFIG_LEARN_MAX_PER_CATEGORY")? {
            self.learning.max_suggestions_per_category = value as usize;
        }
        if let Some(value) = env_u32("CONFIG_LEARN_MIN_OCCURRENCES")? {
            self.learning.min_occurrences = value;
        }
        if let Some(value) = env_f64("CONFIG_LEARN_CONFIDENCE_THRESHOLD")? {
            self.learning.confidence_threshold = value;
        }
        if let Some(value) = env_bool("CONFIG_LEARN_META_LEARNING") {
            self.learning.meta_learning = value;
        }
        if let Some(value) = env_bool("CONFIG_LEARN_FILTER_REJECTED") {
            self.learning.filter_rejected = value;
        }
        if let Some(values) = env_list("CONFIG_LEARN_CATEGORIES") {
            self.learning.categories = values
                .iter()
                .map(|v| v.parse())
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(value) = env_u32("CONFIG_LEARN_RETENTION_DAYS")? {
            self.rejections.retention_days = value;
        }
        if let Some(value) = env_u64("CONFIG_LEARN_CACHE_TTL_SECONDS")? {
            self.rejections.cache_ttl = Duration::from_secs(value);
        }

        if let Some(value) = env_string("CONFIG_LEARN_REJECTION_LOG") {
            self.paths.rejection_log = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("CONFIG_LEARN_THRESHOLD_STATE") {
            self.paths.threshold_state = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("CONFIG_LEARN_CANDIDATES_DIR") {
            self.paths.candidates_dir = Some(PathBuf::from(value));
        }

        Ok(())
    }

    /// Reject combinations the calibrator cannot honor.
    pub fn validate(&self) -> Result<()> {
        let learning = &self.learning;
        if !(0.0..=1.0).contains(&learning.confidence_threshold) {
            return Err(LearnError::Config(format!(
                "learning.confidence_threshold {} outside [0, 1]",
                learning.confidence_threshold
            )));
        }
        if learning.max_suggestions_per_category == 0 {
            return Err(LearnError::Config(
                "learning.max_suggestions_per_category must be at least 1".to_string(),
            ));
        }
        let cal = &self.calibration;
        if cal.low_water > cal.high_water {
            return Err(LearnError::Config(format!(
                "calibration.low_water {} above high_water {}",
                cal.low_water, cal.high_water
            )));
        }
        if cal.min_occurrences_floor > cal.min_occurrences_ceiling {
            return Err(LearnError::Config(
                "calibration.min_occurrences_floor above min_occurrences_ceiling".to_string(),
            ));
        }
        for (name, value) in [
            ("confidence_floor", cal.confidence_floor),
            ("confidence_ceiling", cal.confidence_ceiling),
            ("confidence_step", cal.confidence_step),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LearnError::Config(format!(
                    "calibration.{name} {value} outside [0, 1]"
                )));
            }
        }
        if cal.confidence_floor > cal.confidence_ceiling {
            return Err(LearnError::Config(
                "calibration.confidence_floor above confidence_ceiling".to_string(),
            ));
        }
        Ok(())
    }

    /// Starting thresholds for categories the calibrator has not seen.
    #[must_use]
    pub const fn default_thresholds(&self) -> CategoryThresholds {
        CategoryThresholds {
            min_occurrences: self.learning.min_occurrences,
            confidence_threshold: self.learning.confidence_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub analysis_window_days: u32,
    pub max_suggestions_per_category: usize,
    pub min_occurrences: u32,
    pub confidence_threshold: f64,
    pub meta_learning: bool,
    pub filter_rejected: bool,
    pub categories: Vec<SuggestionCategory>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            analysis_window_days: 30,
            max_suggestions_per_category: 10,
            min_occurrences: 3,
            confidence_threshold: 0.7,
            meta_learning: true,
            filter_rejected: true,
            categories: SuggestionCategory::all().to_vec(),
        }
    }
}

impl LearningConfig {
    fn merge(&mut self, patch: LearningPatch) {
        if let Some(value) = patch.analysis_window_days {
            self.analysis_window_days = value;
        }
        if let Some(value) = patch.max_suggestions_per_category {
            self.max_suggestions_per_category = value;
        }
        if let Some(value) = patch.min_occurrences {
            self.min_occurrences = value;
        }
        if let Some(value) = patch.confidence_threshold {
            self.confidence_threshold = value;
        }
        if let Some(value) = patch.meta_learning {
            self.meta_learning = value;
        }
        if let Some(value) = patch.filter_rejected {
            self.filter_rejected = value;
        }
        if let Some(values) = patch.categories {
            self.categories = values;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectionsConfig {
    pub retention_days: u32,
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
}

impl Default for RejectionsConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            cache_ttl: Duration::from_secs(30),
        }
    }
}

impl RejectionsConfig {
    fn merge(&mut self, patch: RejectionsPatch) {
        if let Some(value) = patch.retention_days {
            self.retention_days = value;
        }
        if let Some(value) = patch.cache_ttl {
            self.cache_ttl = value;
        }
    }
}

/// Constants of the threshold controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub high_water: f64,
    pub low_water: f64,
    /// Runs averaged into the rolling acceptance rate.
    pub rolling_window: usize,
    /// Runs required before the controller moves at all.
    pub min_runs: usize,
    pub history_limit: usize,
    pub occurrence_step: u32,
    pub confidence_step: f64,
    pub min_occurrences_floor: u32,
    pub min_occurrences_ceiling: u32,
    pub confidence_floor: f64,
    pub confidence_ceiling: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            high_water: 0.8,
            low_water: 0.3,
            rolling_window: 3,
            min_runs: 3,
            history_limit: 20,
            occurrence_step: 1,
            confidence_step: 0.05,
            min_occurrences_floor: 1,
            min_occurrences_ceiling: 20,
            confidence_floor: 0.3,
            confidence_ceiling: 0.95,
        }
    }
}

impl CalibrationConfig {
    fn merge(&mut self, patch: CalibrationPatch) {
        if let Some(value) = patch.high_water {
            self.high_water = value;
        }
        if let Some(value) = patch.low_water {
            self.low_water = value;
        }
        if let Some(value) = patch.rolling_window {
            self.rolling_window = value;
        }
        if let Some(value) = patch.min_runs {
            self.min_runs = value;
        }
        if let Some(value) = patch.history_limit {
            self.history_limit = value;
        }
        if let Some(value) = patch.occurrence_step {
            self.occurrence_step = value;
        }
        if let Some(value) = patch.confidence_step {
            self.confidence_step = value;
        }
        if let Some(value) = patch.min_occurrences_floor {
            self.min_occurrences_floor = value;
        }
        if let Some(value) = patch.min_occurrences_ceiling {
            self.min_occurrences_ceiling = value;
        }
        if let Some(value) = patch.confidence_floor {
            self.confidence_floor = value;
        }
        if let Some(value) = patch.confidence_ceiling {
            self.confidence_ceiling = value;
        }
    }
}

/// Optional overrides; unset paths live under the data root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub rejection_log: Option<PathBuf>,
    #[serde(default)]
    pub threshold_state: Option<PathBuf>,
    #[serde(default)]
    pub candidates_dir: Option<PathBuf>,
}

impl PathsConfig {
    fn merge(&mut self, patch: PathsPatch) {
        if let Some(value) = patch.rejection_log {
            self.rejection_log = Some(value);
        }
        if let Some(value) = patch.threshold_state {
            self.threshold_state = Some(value);
        }
        if let Some(value) = patch.candidates_dir {
            self.candidates_dir = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub learning: Option<LearningPatch>,
    pub rejections: Option<RejectionsPatch>,
    pub calibration: Option<CalibrationPatch>,
    pub paths: Option<PathsPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LearningPatch {
    pub analysis_window_days: Option<u32>,
    pub max_suggestions_per_category: Option<usize>,
    pub min_occurrences: Option<u32>,
    pub confidence_threshold: Option<f64>,
    pub meta_learning: Option<bool>,
    pub filter_rejected: Option<bool>,
    pub categories: Option<Vec<SuggestionCategory>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RejectionsPatch {
    pub retention_days: Option<u32>,
    #[serde(default, with = "humantime_serde")]
    pub cache_ttl: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CalibrationPatch {
    pub high_water: Option<f64>,
    pub low_water: Option<f64>,
    pub rolling_window: Option<usize>,
    pub min_runs: Option<usize>,
    pub history_limit: Option<usize>,
    pub occurrence_step: Option<u32>,
    pub confidence_step: Option<f64>,
    pub min_occurrences_floor: Option<u32>,
    pub min_occurrences_ceiling: Option<u32>,
    pub confidence_floor: Option<f64>,
    pub confidence_ceiling: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PathsPatch {
    pub rejection_log: Option<PathBuf>,
    pub threshold_state: Option<PathBuf>,
    pub candidates_dir: Option<PathBuf>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u32>().map(Some).map_err(|err| {
            LearnError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            LearnError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<f64>().map(Some).map_err(|err| {
            LearnError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
