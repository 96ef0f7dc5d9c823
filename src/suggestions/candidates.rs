//! File-backed suggestion source.
//!
//! External analyzers (permission mining, MCP token statistics, command
//! sequence mining, ...) drop their raw findings into
//! `<candidates_dir>/<category>.jsonl`. This source applies the run's window
//! and detection thresholds to those findings.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LearnError, Result};
use crate::utils::window_start;

use super::source::{SourceRequest, SuggestionSource};
use super::types::{Priority, Suggestion, SuggestionCategory, SuggestionPayload};

/// One analyzer finding, as written to a candidates file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub description: String,
    pub priority: Priority,
    pub payload: SuggestionPayload,
    /// How many times the analyzer observed the pattern.
    pub occurrences: u32,
    /// Analyzer confidence in [0, 1].
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CandidateFileSource {
    category: SuggestionCategory,
    path: PathBuf,
}

impl CandidateFileSource {
    pub fn new(category: SuggestionCategory, path: impl Into<PathBuf>) -> Self {
        Self {
            category,
            path: path.into(),
        }
    }

    /// Conventional location of a category's candidates inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path, category: SuggestionCategory) -> Self {
        Self::new(category, dir.join(format!("{}.jsonl", category.as_str())))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, message: impl Into<String>) -> LearnError {
        LearnError::SourceFailure {
            category: self.category,
            message: message.into(),
        }
    }

    fn read_records(&self) -> Result<Vec<CandidateRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .map_err(|err| self.failure(format!("open {}: {err}", self.path.display())))?;
        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| self.failure(format!("read: {err}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CandidateRecord = serde_json::from_str(&line).map_err(|err| {
                self.failure(format!("{}:{}: {err}", self.path.display(), idx + 1))
            })?;
            if record.payload.category() != self.category {
                return Err(self.failure(format!(
                    "{}:{}: {} payload in {} candidates",
                    self.path.display(),
                    idx + 1,
                    record.payload.category(),
                    self.category
                )));
            }
            records.push(record);
        }
        Ok(records)
    }
}

impl SuggestionSource for CandidateFileSource {
    fn category(&self) -> SuggestionCategory {
        self.category
    }

    fn generate(&self, request: &SourceRequest) -> Result<Vec<Suggestion>> {
        let cutoff = window_start(Utc::now(), request.window_days);
        let mut records: Vec<_> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.observed_at >= cutoff)
            .filter(|r| r.occurrences >= request.min_occurrences)
            .filter(|r| r.confidence >= request.confidence_threshold)
            .collect();
        records.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            })
        });
        records.truncate(request.max_results);
        debug!(
            category = %self.category,
            kept = records.len(),
            "candidate records passed thresholds"
        );

        records
            .into_iter()
            .map(|r| {
                Suggestion::new(r.description, r.priority, r.payload)
                    .map_err(|err| self.failure(err.to_string()))
            })
            .collect()
    }
}
