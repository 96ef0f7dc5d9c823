//! Shared test utilities for config-learn.

use std::collections::VecDeque;

use crate::error::{LearnError, Result};
use crate::learning::{ApprovalInput, ApprovalIo, PromptItem};
use crate::suggestions::{SourceRequest, Suggestion, SuggestionCategory, SuggestionSource};

pub mod fixtures;

pub use fixtures::UnitTestFixture;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
    pub should_panic: bool,
}

/// Run table-driven tests with detailed logging.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> std::result::Result<(), String>
where
    I: std::fmt::Debug + Clone + std::panic::RefUnwindSafe,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    for case in cases {
        let start = std::time::Instant::now();
        println!("[TEST] Running: {}", case.name);
        println!("[TEST] Input: {:?}", case.input);

        let result = std::panic::catch_unwind(|| test_fn(case.input.clone()));
        let elapsed = start.elapsed();

        if case.should_panic {
            if result.is_ok() {
                return Err(format!("Test '{}' expected panic", case.name));
            }
            println!("[TEST] Expected panic occurred");
            println!("[TEST] PASSED: {} ({:?})\n", case.name, elapsed);
            continue;
        }

        let actual = match result {
            Ok(value) => value,
            Err(_) => {
                return Err(format!("Test '{}' panicked unexpectedly", case.name));
            }
        };

        println!("[TEST] Expected: {:?}", case.expected);
        println!("[TEST] Actual: {:?}", actual);
        println!("[TEST] Timing: {:?}", elapsed);

        if actual != case.expected {
            return Err(format!(
                "Test '{}' failed: expected {:?}, got {:?}",
                case.name, case.expected, actual
            ));
        }
        println!("[TEST] PASSED: {} ({:?})\n", case.name, elapsed);
    }
    Ok(())
}

/// Approval boundary fed from a fixed script of answers.
///
/// Every read (including the final apply confirmation) consumes one line. An
/// exhausted script reads as an interrupt, and declines confirmation.
#[derive(Debug, Default)]
pub struct ScriptedIo {
    script: VecDeque<String>,
    pub presented: Vec<usize>,
    pub invalid_prompts: usize,
    pub warnings: Vec<String>,
    pub confirmations: usize,
}

impl ScriptedIo {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl ApprovalIo for ScriptedIo {
    fn present(&mut self, item: &PromptItem<'_>) -> Result<()> {
        self.presented.push(item.position);
        Ok(())
    }

    fn read_input(&mut self) -> Result<ApprovalInput> {
        Ok(self
            .script
            .pop_front()
            .map_or(ApprovalInput::Interrupt, |line| ApprovalInput::parse(&line)))
    }

    fn invalid_input(&mut self) -> Result<()> {
        self.invalid_prompts += 1;
        Ok(())
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn confirm_apply(&mut self, _pending: &[Suggestion]) -> Result<bool> {
        self.confirmations += 1;
        Ok(self
            .script
            .pop_front()
            .is_some_and(|line| ApprovalInput::parse(&line) == ApprovalInput::Approve))
    }
}

/// Source returning a fixed list, or always failing.
pub struct StaticSource {
    category: SuggestionCategory,
    suggestions: Option<Vec<Suggestion>>,
}

impl StaticSource {
    #[must_use]
    pub const fn new(category: SuggestionCategory, suggestions: Vec<Suggestion>) -> Self {
        Self {
            category,
            suggestions: Some(suggestions),
        }
    }

    #[must_use]
    pub const fn failing(category: SuggestionCategory) -> Self {
        Self {
            category,
            suggestions: None,
        }
    }
}

impl SuggestionSource for StaticSource {
    fn category(&self) -> SuggestionCategory {
        self.category
    }

    fn generate(&self, request: &SourceRequest) -> Result<Vec<Suggestion>> {
        match &self.suggestions {
            Some(items) => Ok(items.iter().take(request.max_results).cloned().collect()),
            None => Err(LearnError::SourceFailure {
                category: self.category,
                message: "analyzer unavailable".to_string(),
            }),
        }
    }
}
