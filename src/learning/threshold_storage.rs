//! JSON storage for calibrated thresholds.

use std::fs;
use std::path::Path;

use crate::error::{LearnError, Result};
use crate::utils::write_atomic;

use super::calibrator::ThresholdState;

const ARTIFACT: &str = "threshold state";

/// Load the state document; `None` when it does not exist or is empty.
pub fn load_state(path: &Path) -> Result<Option<ThresholdState>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let state: ThresholdState = serde_json::from_str(&raw)
        .map_err(|err| LearnError::Serialization(format!("threshold state parse: {err}")))?;
    Ok(Some(state))
}

/// Atomically replace the state document; durable on return.
pub fn save_state(path: &Path, state: &ThresholdState) -> Result<()> {
    let payload = serde_json::to_string_pretty(state)
        .map_err(|err| LearnError::persistence(ARTIFACT, err))?;
    write_atomic(path, payload.as_bytes()).map_err(|err| LearnError::persistence(ARTIFACT, err))
}
