//! Per-run aggregate of collected suggestions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::suggestions::{Suggestion, SuggestionCategory, SuggestionPayload};
use crate::utils::format_size;

pub const NO_IMPROVEMENTS: &str = "No improvements identified";

/// Transient report for one run. Serialized for robot output, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LearningReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub suggestions_by_category: BTreeMap<SuggestionCategory, Vec<Suggestion>>,
    pub meta_insights: BTreeMap<String, f64>,
    pub total_suggestions: usize,
    pub estimated_impact_summary: String,
}

impl LearningReport {
    /// Cap each category at `max_per_category` and summarize the impact.
    #[must_use]
    pub fn consolidate(
        collected: BTreeMap<SuggestionCategory, Vec<Suggestion>>,
        max_per_category: usize,
        meta_insights: BTreeMap<String, f64>,
    ) -> Self {
        let suggestions_by_category: BTreeMap<_, _> = collected
            .into_iter()
            .map(|(category, mut items)| {
                items.truncate(max_per_category);
                (category, items)
            })
            .collect();
        let total_suggestions = suggestions_by_category.values().map(Vec::len).sum();
        let snippets: Vec<_> = suggestions_by_category
            .iter()
            .filter_map(|(category, items)| impact_snippet(*category, items))
            .collect();
        let estimated_impact_summary = if snippets.is_empty() {
            NO_IMPROVEMENTS.to_string()
        } else {
            snippets.join("; ")
        };

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            suggestions_by_category,
            meta_insights,
            total_suggestions,
            estimated_impact_summary,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_suggestions == 0
    }

    /// All suggestions in presentation order (category, then source order).
    pub fn suggestions(&self) -> impl Iterator<Item = &Suggestion> {
        self.suggestions_by_category.values().flatten()
    }

    #[must_use]
    pub fn count(&self, category: SuggestionCategory) -> usize {
        self.suggestions_by_category.get(&category).map_or(0, Vec::len)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn impact_snippet(category: SuggestionCategory, items: &[Suggestion]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let n = items.len();
    let snippet = match category {
        SuggestionCategory::Permission => {
            let prompts: u64 = items
                .iter()
                .map(|s| match s.payload() {
                    SuggestionPayload::Permission { occurrences, .. } => u64::from(*occurrences),
                    _ => 0,
                })
                .sum();
            format!(
                "{} would remove {prompts} approval prompts",
                plural(n, "permission rule")
            )
        }
        SuggestionCategory::McpOptimization => {
            let tokens: u64 = items
                .iter()
                .map(|s| match s.payload() {
                    SuggestionPayload::McpOptimization {
                        estimated_tokens, ..
                    } => *estimated_tokens,
                    _ => 0,
                })
                .sum();
            format!(
                "{} could save ~{tokens} tokens per session",
                plural(n, "MCP server change")
            )
        }
        SuggestionCategory::ContextOptimization => {
            let bytes: u64 = items
                .iter()
                .map(|s| match s.payload() {
                    SuggestionPayload::ContextOptimization {
                        estimated_savings_bytes,
                        ..
                    } => *estimated_savings_bytes,
                    _ => 0,
                })
                .sum();
            format!(
                "{} could keep ~{} out of context",
                plural(n, "context exclusion"),
                format_size(bytes)
            )
        }
        SuggestionCategory::Workflow => format!(
            "{} could become slash commands",
            plural(n, "repeated command sequence")
        ),
        SuggestionCategory::InstructionImprovement => {
            format!("{} for CLAUDE.md", plural(n, "instruction improvement"))
        }
        SuggestionCategory::CrossProjectTransfer => format!(
            "{} could transfer from other projects",
            plural(n, "pattern")
        ),
    };
    Some(snippet)
}
