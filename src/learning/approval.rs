//! Interactive approval workflow.
//!
//! The workflow is an explicit state machine over the ordered suggestions of a
//! report:
//!
//! ```text
//! Presenting(1) -> Presenting(2) -> ... -> Presenting(N) -> Complete
//!       |  a/s -> Complete
//!       |  q   -> Quit
//!       |  ^C  -> Interrupted
//!       |  ?   -> Presenting(i)   (invalid input, same suggestion)
//! ```
//!
//! All terminal I/O goes through [`ApprovalIo`], so the workflow runs the same
//! against a console or a scripted test double. It never applies changes or
//! touches thresholds; those happen after it returns.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::suggestions::{ChangePreview, Suggestion};

use super::rejections::RejectionMemory;

/// One operator answer for the suggestion currently presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalInput {
    Approve,
    Reject,
    ApproveAll,
    SkipAll,
    Quit,
    /// Ctrl-C or end of input.
    Interrupt,
    Invalid,
}

impl ApprovalInput {
    /// Parse a console answer (`y/n/a/s/q`, case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Approve,
            "n" | "no" => Self::Reject,
            "a" | "all" => Self::ApproveAll,
            "s" | "skip" => Self::SkipAll,
            "q" | "quit" => Self::Quit,
            _ => Self::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "position", rename_all = "snake_case")]
pub enum ApprovalState {
    /// Showing suggestion `i` (1-based).
    Presenting(usize),
    Quit,
    Interrupted,
    Complete,
}

impl ApprovalState {
    #[must_use]
    pub const fn initial(total: usize) -> Self {
        if total == 0 {
            Self::Complete
        } else {
            Self::Presenting(1)
        }
    }

    /// Pure transition function; terminal states absorb every input.
    #[must_use]
    pub const fn next(self, input: ApprovalInput, total: usize) -> Self {
        let Self::Presenting(i) = self else {
            return self;
        };
        match input {
            ApprovalInput::Approve | ApprovalInput::Reject => {
                if i >= total {
                    Self::Complete
                } else {
                    Self::Presenting(i + 1)
                }
            }
            ApprovalInput::ApproveAll | ApprovalInput::SkipAll => Self::Complete,
            ApprovalInput::Quit => Self::Quit,
            ApprovalInput::Interrupt => Self::Interrupted,
            ApprovalInput::Invalid => Self::Presenting(i),
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Presenting(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
    /// Left unresolved by skip-all, quit, or interrupt.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalDecision {
    pub suggestion: Suggestion,
    pub outcome: DecisionOutcome,
}

/// What the I/O boundary shows for one suggestion.
#[derive(Debug, Clone)]
pub struct PromptItem<'a> {
    pub position: usize,
    pub total: usize,
    pub suggestion: &'a Suggestion,
    pub preview: ChangePreview,
}

/// Operator-facing boundary of the approval and apply phases.
pub trait ApprovalIo {
    fn present(&mut self, item: &PromptItem<'_>) -> Result<()>;

    fn read_input(&mut self) -> Result<ApprovalInput>;

    /// Called after an unrecognized answer, before re-reading.
    fn invalid_input(&mut self) -> Result<()> {
        Ok(())
    }

    fn warn(&mut self, message: &str);

    /// List every pending mutation and ask for a final `y/N`.
    fn confirm_apply(&mut self, pending: &[Suggestion]) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    /// Approved suggestions in original order.
    pub approved: Vec<Suggestion>,
    /// Resolved decisions, in presentation order.
    pub decisions: Vec<ApprovalDecision>,
    pub unresolved: Vec<Suggestion>,
    pub terminal: ApprovalState,
    pub warnings: Vec<String>,
}

impl ApprovalOutcome {
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.outcome == DecisionOutcome::Rejected)
            .count()
    }

    #[must_use]
    pub const fn interrupted(&self) -> bool {
        matches!(self.terminal, ApprovalState::Interrupted)
    }

    /// Unresolved suggestions as `Skipped` decisions.
    #[must_use]
    pub fn skipped_decisions(&self) -> Vec<ApprovalDecision> {
        self.unresolved
            .iter()
            .map(|s| ApprovalDecision {
                suggestion: s.clone(),
                outcome: DecisionOutcome::Skipped,
            })
            .collect()
    }
}

pub struct ApprovalWorkflow<'a> {
    rejections: &'a RejectionMemory,
    project_context: String,
}

impl<'a> ApprovalWorkflow<'a> {
    pub fn new(rejections: &'a RejectionMemory, project_context: impl Into<String>) -> Self {
        Self {
            rejections,
            project_context: project_context.into(),
        }
    }

    /// Drive the state machine to a terminal state.
    ///
    /// I/O failures end the walk as `Interrupted`; decisions made so far are
    /// kept.
    pub fn run(&self, suggestions: &[Suggestion], io: &mut dyn ApprovalIo) -> ApprovalOutcome {
        let total = suggestions.len();
        let mut state = ApprovalState::initial(total);
        let mut decisions: Vec<ApprovalDecision> = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut shown = None;

        while let ApprovalState::Presenting(i) = state {
            let suggestion = &suggestions[i - 1];
            if shown != Some(i) {
                let item = PromptItem {
                    position: i,
                    total,
                    suggestion,
                    preview: suggestion.preview(),
                };
                if let Err(err) = io.present(&item) {
                    warnings.push(format!("approval aborted: {err}"));
                    state = state.next(ApprovalInput::Interrupt, total);
                    continue;
                }
                shown = Some(i);
            }

            let input = io.read_input().unwrap_or_else(|err| {
                warnings.push(format!("approval aborted: {err}"));
                ApprovalInput::Interrupt
            });
            debug!(position = i, ?input, "approval input");

            match input {
                ApprovalInput::Approve => decisions.push(ApprovalDecision {
                    suggestion: suggestion.clone(),
                    outcome: DecisionOutcome::Approved,
                }),
                ApprovalInput::Reject => {
                    if let Err(err) = self.rejections.record(
                        suggestion.category(),
                        suggestion.fingerprint(),
                        &self.project_context,
                    ) {
                        let message = format!("could not record rejection: {err}");
                        warn!(fingerprint = %suggestion.fingerprint(), error = %err, "rejection not persisted");
                        io.warn(&message);
                        warnings.push(message);
                    }
                    decisions.push(ApprovalDecision {
                        suggestion: suggestion.clone(),
                        outcome: DecisionOutcome::Rejected,
                    });
                }
                ApprovalInput::ApproveAll => {
                    decisions.extend(suggestions[i - 1..].iter().map(|s| ApprovalDecision {
                        suggestion: s.clone(),
                        outcome: DecisionOutcome::Approved,
                    }));
                }
                ApprovalInput::Invalid => {
                    if let Err(err) = io.invalid_input() {
                        warnings.push(format!("approval aborted: {err}"));
                        state = state.next(ApprovalInput::Interrupt, total);
                        continue;
                    }
                }
                ApprovalInput::SkipAll | ApprovalInput::Quit | ApprovalInput::Interrupt => {}
            }
            state = state.next(input, total);
        }

        let approved = decisions
            .iter()
            .filter(|d| d.outcome == DecisionOutcome::Approved)
            .map(|d| d.suggestion.clone())
            .collect();
        let unresolved = suggestions[decisions.len()..].to_vec();

        ApprovalOutcome {
            approved,
            decisions,
            unresolved,
            terminal: state,
            warnings,
        }
    }
}
