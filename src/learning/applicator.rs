//! Applies approved suggestions through per-category handlers.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LearnError, Result};
use crate::suggestions::{Suggestion, SuggestionCategory};

/// Performs the real side effect for one category.
pub trait CategoryHandler {
    fn category(&self) -> SuggestionCategory;

    /// Apply one suggestion and describe what changed. In dry-run mode,
    /// describe what would change without touching disk.
    fn apply(&self, suggestion: &Suggestion, dry_run: bool) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedItem {
    pub suggestion: Suggestion,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub suggestion: Suggestion,
    pub error: String,
}

/// Per-item outcome of an apply pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyResult {
    pub succeeded: Vec<AppliedItem>,
    pub failed: Vec<FailedItem>,
    pub errors: Vec<String>,
}

impl ApplyResult {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Suggestions to hand back to [`Applicator::apply`] for a retry.
    #[must_use]
    pub fn failed_suggestions(&self) -> Vec<Suggestion> {
        self.failed.iter().map(|f| f.suggestion.clone()).collect()
    }
}

#[derive(Default)]
pub struct Applicator {
    handlers: BTreeMap<SuggestionCategory, Box<dyn CategoryHandler>>,
    dry_run: bool,
}

impl Applicator {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            handlers: BTreeMap::new(),
            dry_run,
        }
    }

    pub fn register(&mut self, handler: Box<dyn CategoryHandler>) {
        self.handlers.insert(handler.category(), handler);
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: Vec<Box<dyn CategoryHandler>>) -> Self {
        for handler in handlers {
            self.register(handler);
        }
        self
    }

    pub const fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply every suggestion; one failure never stops the others.
    #[must_use]
    pub fn apply(&self, approved: &[Suggestion]) -> ApplyResult {
        let mut result = ApplyResult::default();
        let groups: BTreeMap<SuggestionCategory, Vec<&Suggestion>> = approved
            .iter()
            .into_group_map_by(|s| s.category())
            .into_iter()
            .collect();

        for (category, items) in groups {
            let handler = self.handlers.get(&category);
            debug!(%category, items = items.len(), dry_run = self.dry_run, "applying group");
            for suggestion in items {
                let outcome = handler.map_or(Err(LearnError::NoHandler(category)), |h| {
                    h.apply(suggestion, self.dry_run)
                });
                match outcome {
                    Ok(detail) => result.succeeded.push(AppliedItem {
                        suggestion: suggestion.clone(),
                        detail,
                    }),
                    Err(err) => {
                        warn!(%category, fingerprint = %suggestion.fingerprint(), error = %err, "apply failed");
                        result
                            .errors
                            .push(format!("{}: {err}", suggestion.description()));
                        result.failed.push(FailedItem {
                            suggestion: suggestion.clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestions::{Priority, SuggestionPayload};
    use std::cell::RefCell;

    struct RecordingHandler {
        category: SuggestionCategory,
        fail: bool,
        seen: RefCell<Vec<String>>,
    }

    impl RecordingHandler {
        fn boxed(category: SuggestionCategory, fail: bool) -> Box<dyn CategoryHandler> {
            Box::new(Self {
                category,
                fail,
                seen: RefCell::new(Vec::new()),
            })
        }
    }

    impl CategoryHandler for RecordingHandler {
        fn category(&self) -> SuggestionCategory {
            self.category
        }

        fn apply(&self, suggestion: &Suggestion, _dry_run: bool) -> Result<String> {
            self.seen.borrow_mut().push(suggestion.description().to_string());
            if self.fail {
                return Err(LearnError::application(self.category, "disk full"));
            }
            Ok(format!("applied {}", suggestion.description()))
        }
    }

    fn permission(rule: &str) -> Suggestion {
        Suggestion::new(
            format!("allow {rule}"),
            Priority::HIGH,
            SuggestionPayload::Permission {
                rule: rule.to_string(),
                occurrences: 4,
            },
        )
        .unwrap()
    }

    fn workflow(name: &str) -> Suggestion {
        Suggestion::new(
            format!("add /{name}"),
            Priority::LOW,
            SuggestionPayload::Workflow {
                name: name.to_string(),
                commands: vec!["make".to_string()],
                occurrences: 4,
            },
        )
        .unwrap()
    }

    #[test]
    fn failing_category_does_not_block_others() {
        let applicator = Applicator::new(false).with_handlers(vec![
            RecordingHandler::boxed(SuggestionCategory::Permission, false),
            RecordingHandler::boxed(SuggestionCategory::Workflow, true),
        ]);
        let approved = vec![permission("Bash(a)"), workflow("ship"), permission("Bash(b)")];

        let result = applicator.apply(&approved);

        assert_eq!(result.succeeded.len(), 2);
        assert!(
            result
                .succeeded
                .iter()
                .all(|i| i.suggestion.category() == SuggestionCategory::Permission)
        );
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.failed_suggestions(), vec![workflow("ship")]);
    }

    #[test]
    fn missing_handler_fails_each_item() {
        let applicator = Applicator::new(false);
        let result = applicator.apply(&[permission("Bash(a)"), permission("Bash(b)")]);
        assert!(result.succeeded.is_empty());
        assert_eq!(result.failed.len(), 2);
        assert!(result.errors[0].contains("no handler registered for permission"));
    }

    #[test]
    fn empty_input_is_clean() {
        let result = Applicator::new(true).apply(&[]);
        assert!(result.is_clean());
        assert!(result.succeeded.is_empty());
    }
}
