use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{LearnError, Result};
use crate::learning::{RejectionMemory, ThresholdCalibrator};

const ROOT_ENV: &str = "CONFIG_LEARN_ROOT";
const ROOT_DIR_NAME: &str = ".config-learn";

/// On-disk artifacts of the pipeline, resolved once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningPaths {
    pub rejection_log: PathBuf,
    pub threshold_state: PathBuf,
    pub candidates_dir: PathBuf,
}

impl LearningPaths {
    #[must_use]
    pub fn resolve(root: &Path, config: &Config) -> Self {
        let under_root = |configured: &Option<PathBuf>, default: &str| {
            configured.as_ref().map_or_else(
                || root.join(default),
                |path| {
                    if path.is_absolute() {
                        path.clone()
                    } else {
                        root.join(path)
                    }
                },
            )
        };
        Self {
            rejection_log: under_root(&config.paths.rejection_log, "rejections.jsonl"),
            threshold_state: under_root(&config.paths.threshold_state, "thresholds.json"),
            candidates_dir: under_root(&config.paths.candidates_dir, "candidates"),
        }
    }
}

pub struct AppContext {
    pub config: Config,
    pub paths: LearningPaths,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        Ok(Self::new(&root, config, cli.robot))
    }

    #[must_use]
    pub fn new(root: &Path, config: Config, robot_mode: bool) -> Self {
        let paths = LearningPaths::resolve(root, &config);
        Self {
            config,
            paths,
            robot_mode,
        }
    }

    pub fn rejection_memory(&self) -> Arc<RejectionMemory> {
        Arc::new(RejectionMemory::new(
            &self.paths.rejection_log,
            self.config.rejections.retention_days,
            self.config.rejections.cache_ttl,
        ))
    }

    pub fn calibrator(&self) -> ThresholdCalibrator {
        ThresholdCalibrator::open(
            &self.paths.threshold_state,
            self.config.calibration.clone(),
            self.config.default_thresholds(),
        )
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ROOT_DIR_NAME) {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| LearnError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("config-learn"))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_dir())
}
