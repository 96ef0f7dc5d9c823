//! Append-only rejection memory with a short-lived read cache.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LearnError, Result};
use crate::suggestions::{Fingerprint, SuggestionCategory};
use crate::utils::{window_start, write_atomic};

const ARTIFACT: &str = "rejection log";

/// One operator rejection. Never rewritten once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub timestamp: DateTime<Utc>,
    pub category: SuggestionCategory,
    pub fingerprint: Fingerprint,
    pub project_context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactionStats {
    pub kept: usize,
    pub removed: usize,
}

struct CachedLog {
    loaded_at: Instant,
    records: Arc<Vec<RejectionRecord>>,
}

pub struct RejectionMemory {
    log_path: PathBuf,
    retention_days: u32,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedLog>>,
}

impl RejectionMemory {
    pub fn new(log_path: impl Into<PathBuf>, retention_days: u32, cache_ttl: Duration) -> Self {
        Self {
            log_path: log_path.into(),
            retention_days,
            cache_ttl,
            cache: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    #[must_use]
    pub const fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Record a rejection stamped with the current time.
    pub fn record(
        &self,
        category: SuggestionCategory,
        fingerprint: &Fingerprint,
        project_context: &str,
    ) -> Result<()> {
        self.append(&RejectionRecord {
            timestamp: Utc::now(),
            category,
            fingerprint: fingerprint.clone(),
            project_context: project_context.to_string(),
        })
    }

    /// Append one record and flush it to disk before returning.
    pub fn append(&self, record: &RejectionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|err| LearnError::persistence(ARTIFACT, err))?;
        line.push('\n');

        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent).map_err(|err| LearnError::persistence(ARTIFACT, err))?;
        }
        let written = {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .map_err(|err| LearnError::persistence(ARTIFACT, err))?;
            file.lock_exclusive()
                .map_err(|err| LearnError::persistence(ARTIFACT, err))?;
            // The lock is released when `file` closes at the end of this block.
            file.write_all(line.as_bytes())
                .and_then(|()| file.sync_data())
        };
        self.invalidate();
        written.map_err(|err| LearnError::persistence(ARTIFACT, err))?;

        debug!(
            category = %record.category,
            fingerprint = %record.fingerprint,
            "rejection recorded"
        );
        Ok(())
    }

    /// Records newer than `window_days`, newest first.
    ///
    /// A record exactly on the cutoff is included.
    pub fn recent(
        &self,
        window_days: u32,
        category: Option<SuggestionCategory>,
    ) -> Result<Vec<RejectionRecord>> {
        let cutoff = window_start(Utc::now(), window_days);
        let records = self.load()?;
        let mut out: Vec<_> = records
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }

    /// Fingerprints rejected for `category` inside the retention window.
    pub fn rejected_fingerprints(
        &self,
        category: SuggestionCategory,
    ) -> Result<HashSet<Fingerprint>> {
        Ok(self
            .recent(self.retention_days, Some(category))?
            .into_iter()
            .map(|r| r.fingerprint)
            .collect())
    }

    /// Rewrite the log keeping only records inside the retention window.
    pub fn compact(&self) -> Result<CompactionStats> {
        let all = self.read_log()?;
        let cutoff = window_start(Utc::now(), self.retention_days);
        let (kept, expired): (Vec<_>, Vec<_>) =
            all.into_iter().partition(|r| r.timestamp >= cutoff);
        if expired.is_empty() {
            return Ok(CompactionStats {
                kept: kept.len(),
                removed: 0,
            });
        }

        let mut payload = String::new();
        for record in &kept {
            payload.push_str(
                &serde_json::to_string(record)
                    .map_err(|err| LearnError::persistence(ARTIFACT, err))?,
            );
            payload.push('\n');
        }
        write_atomic(&self.log_path, payload.as_bytes())
            .map_err(|err| LearnError::persistence(ARTIFACT, err))?;
        self.invalidate();

        Ok(CompactionStats {
            kept: kept.len(),
            removed: expired.len(),
        })
    }

    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    fn load(&self) -> Result<Arc<Vec<RejectionRecord>>> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.cache_ttl {
                return Ok(Arc::clone(&cached.records));
            }
        }
        let records = Arc::new(self.read_log()?);
        *cache = Some(CachedLog {
            loaded_at: Instant::now(),
            records: Arc::clone(&records),
        });
        Ok(records)
    }

    fn read_log(&self) -> Result<Vec<RejectionRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.log_path)?;
        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RejectionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    path = %self.log_path.display(),
                    line = idx + 1,
                    error = %err,
                    "skipping malformed rejection record"
                ),
            }
        }
        Ok(records)
    }
}
