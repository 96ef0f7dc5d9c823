//! Suggestion source contract and the per-category registry.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::learning::RejectionMemory;

use super::types::{Suggestion, SuggestionCategory};

/// Parameters handed to every source for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRequest {
    /// Rolling analysis window.
    pub window_days: u32,
    /// Upper bound on returned suggestions.
    pub max_results: usize,
    pub min_occurrences: u32,
    pub confidence_threshold: f64,
}

/// Produces candidate suggestions for one category.
///
/// Implementations read only their own inputs and return an owned list, so
/// sources have no ordering dependency on each other.
pub trait SuggestionSource {
    fn category(&self) -> SuggestionCategory;

    fn generate(&self, request: &SourceRequest) -> Result<Vec<Suggestion>>;
}

/// Drops candidates whose fingerprint was rejected inside the retention window.
pub struct RejectionFilter {
    inner: Box<dyn SuggestionSource>,
    memory: Arc<RejectionMemory>,
}

impl RejectionFilter {
    pub fn new(inner: Box<dyn SuggestionSource>, memory: Arc<RejectionMemory>) -> Self {
        Self { inner, memory }
    }
}

impl SuggestionSource for RejectionFilter {
    fn category(&self) -> SuggestionCategory {
        self.inner.category()
    }

    fn generate(&self, request: &SourceRequest) -> Result<Vec<Suggestion>> {
        let category = self.inner.category();
        let rejected: HashSet<_> = match self.memory.rejected_fingerprints(category) {
            Ok(set) => set,
            Err(err) => {
                warn!(%category, error = %err, "rejection log unreadable; not filtering");
                return self.inner.generate(request);
            }
        };
        if rejected.is_empty() {
            return self.inner.generate(request);
        }

        // Rejected candidates must not take slots from the per-category cap.
        let uncapped = SourceRequest {
            max_results: usize::MAX,
            ..request.clone()
        };
        let candidates = self.inner.generate(&uncapped)?;
        let before = candidates.len();
        let mut kept: Vec<_> = candidates
            .into_iter()
            .filter(|s| !rejected.contains(s.fingerprint()))
            .collect();
        if kept.len() < before {
            debug!(
                %category,
                suppressed = before - kept.len(),
                "suppressed previously rejected suggestions"
            );
        }
        kept.truncate(request.max_results);
        Ok(kept)
    }
}

/// One source per category.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<SuggestionCategory, Box<dyn SuggestionSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any previous source for its category.
    pub fn register(&mut self, source: Box<dyn SuggestionSource>) {
        self.sources.insert(source.category(), source);
    }

    #[must_use]
    pub fn with(mut self, source: Box<dyn SuggestionSource>) -> Self {
        self.register(source);
        self
    }

    /// Wrap every registered source in a [`RejectionFilter`].
    #[must_use]
    pub fn filtered_by(self, memory: &Arc<RejectionMemory>) -> Self {
        let sources = self
            .sources
            .into_iter()
            .map(|(category, source)| {
                let wrapped: Box<dyn SuggestionSource> =
                    Box::new(RejectionFilter::new(source, Arc::clone(memory)));
                (category, wrapped)
            })
            .collect();
        Self { sources }
    }

    #[must_use]
    pub fn get(&self, category: SuggestionCategory) -> Option<&dyn SuggestionSource> {
        self.sources.get(&category).map(|source| &**source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
