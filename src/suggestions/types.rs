//! Suggestion data model: categories, priorities, payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};

use super::fingerprint::Fingerprint;

/// Category of improvement a suggestion belongs to.
///
/// Declaration order is the presentation order used by reports and the
/// approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Permission,
    McpOptimization,
    ContextOptimization,
    Workflow,
    InstructionImprovement,
    CrossProjectTransfer,
}

impl SuggestionCategory {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Permission,
            Self::McpOptimization,
            Self::ContextOptimization,
            Self::Workflow,
            Self::InstructionImprovement,
            Self::CrossProjectTransfer,
        ]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::McpOptimization => "mcp_optimization",
            Self::ContextOptimization => "context_optimization",
            Self::Workflow => "workflow",
            Self::InstructionImprovement => "instruction_improvement",
            Self::CrossProjectTransfer => "cross_project_transfer",
        }
    }

    /// Human label for console output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Permission => "Permission",
            Self::McpOptimization => "MCP optimization",
            Self::ContextOptimization => "Context optimization",
            Self::Workflow => "Workflow",
            Self::InstructionImprovement => "Instruction improvement",
            Self::CrossProjectTransfer => "Cross-project transfer",
        }
    }
}

impl fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionCategory {
    type Err = LearnError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().replace('-', "_").as_str() {
            "permission" | "permissions" => Ok(Self::Permission),
            "mcp" | "mcp_optimization" => Ok(Self::McpOptimization),
            "context" | "context_optimization" => Ok(Self::ContextOptimization),
            "workflow" | "workflows" => Ok(Self::Workflow),
            "instruction" | "instruction_improvement" => Ok(Self::InstructionImprovement),
            "cross_project" | "cross_project_transfer" => Ok(Self::CrossProjectTransfer),
            _ => Err(LearnError::Config(format!(
                "unknown suggestion category {value} (expected one of: {})",
                Self::all()
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Suggestion priority, 1 (highest) through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGH: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const LOW: Self = Self(3);

    pub fn new(value: u8) -> Result<Self> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LearnError::InvalidSuggestion(format!(
                "priority {value} outside 1..=3"
            )))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = LearnError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpAction {
    Disable,
    Review,
}

/// Category-specific content of a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionPayload {
    Permission {
        /// Permission rule, e.g. `Bash(cargo test:*)`.
        rule: String,
        occurrences: u32,
    },
    McpOptimization {
        server: String,
        action: McpAction,
        estimated_tokens: u64,
    },
    ContextOptimization {
        /// Glob of paths to keep out of context.
        pattern: String,
        estimated_savings_bytes: u64,
    },
    Workflow {
        /// Slash command name, without the leading `/`.
        name: String,
        commands: Vec<String>,
        occurrences: u32,
    },
    InstructionImprovement {
        section: String,
        text: String,
    },
    CrossProjectTransfer {
        source_project: String,
        section: String,
        text: String,
    },
}

impl SuggestionPayload {
    #[must_use]
    pub const fn category(&self) -> SuggestionCategory {
        match self {
            Self::Permission { .. } => SuggestionCategory::Permission,
            Self::McpOptimization { .. } => SuggestionCategory::McpOptimization,
            Self::ContextOptimization { .. } => SuggestionCategory::ContextOptimization,
            Self::Workflow { .. } => SuggestionCategory::Workflow,
            Self::InstructionImprovement { .. } => SuggestionCategory::InstructionImprovement,
            Self::CrossProjectTransfer { .. } => SuggestionCategory::CrossProjectTransfer,
        }
    }

    fn validate(&self) -> Result<()> {
        let empty = match self {
            Self::Permission { rule, .. } => rule.trim().is_empty(),
            Self::McpOptimization { server, .. } => server.trim().is_empty(),
            Self::ContextOptimization { pattern, .. } => pattern.trim().is_empty(),
            Self::Workflow { name, commands, .. } => {
                commands.is_empty()
                    || name.trim().is_empty()
                    || !name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            }
            Self::InstructionImprovement { section, text }
            | Self::CrossProjectTransfer { section, text, .. } => {
                section.trim().is_empty() || text.trim().is_empty()
            }
        };
        if empty {
            return Err(LearnError::InvalidSuggestion(format!(
                "incomplete {} payload",
                self.category()
            )));
        }
        Ok(())
    }
}

/// What the operator sees before deciding on a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePreview {
    pub what_will_change: String,
    pub consequences: String,
    pub how_to_undo: String,
}

/// A single proposed improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SuggestionDraft")]
pub struct Suggestion {
    category: SuggestionCategory,
    description: String,
    priority: Priority,
    payload: SuggestionPayload,
    fingerprint: Fingerprint,
}

#[derive(Deserialize)]
struct SuggestionDraft {
    description: String,
    priority: Priority,
    payload: SuggestionPayload,
}

impl TryFrom<SuggestionDraft> for Suggestion {
    type Error = LearnError;

    fn try_from(draft: SuggestionDraft) -> Result<Self> {
        Self::new(draft.description, draft.priority, draft.payload)
    }
}

impl Suggestion {
    /// Build a suggestion; the category is taken from the payload variant.
    pub fn new(
        description: impl Into<String>,
        priority: Priority,
        payload: SuggestionPayload,
    ) -> Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LearnError::InvalidSuggestion(
                "description must not be empty".to_string(),
            ));
        }
        payload.validate()?;
        let category = payload.category();
        let fingerprint = Fingerprint::compute(category, &payload)?;
        Ok(Self {
            category,
            description,
            priority,
            payload,
            fingerprint,
        })
    }

    #[must_use]
    pub const fn category(&self) -> SuggestionCategory {
        self.category
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub const fn payload(&self) -> &SuggestionPayload {
        &self.payload
    }

    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    #[must_use]
    pub fn preview(&self) -> ChangePreview {
        match &self.payload {
            SuggestionPayload::Permission { rule, occurrences } => ChangePreview {
                what_will_change: format!(
                    "Add `{rule}` to permissions.allow in .claude/settings.local.json"
                ),
                consequences: format!(
                    "Matching tool calls run without a prompt (approved manually {occurrences} times)"
                ),
                how_to_undo: format!("Remove `{rule}` from permissions.allow"),
            },
            SuggestionPayload::McpOptimization {
                server,
                action,
                estimated_tokens,
            } => ChangePreview {
                what_will_change: match action {
                    McpAction::Disable => {
                        format!("Add `{server}` to disabledMcpjsonServers")
                    }
                    McpAction::Review => {
                        format!("Mark `{server}` disabled pending review")
                    }
                },
                consequences: format!(
                    "Tools from `{server}` become unavailable; saves ~{estimated_tokens} tokens per session"
                ),
                how_to_undo: format!("Remove `{server}` from disabledMcpjsonServers"),
            },
            SuggestionPayload::ContextOptimization {
                pattern,
                estimated_savings_bytes,
            } => ChangePreview {
                what_will_change: format!("Add `Read({pattern})` to permissions.deny"),
                consequences: format!(
                    "Files matching `{pattern}` stop being read into context (~{} saved)",
                    crate::utils::format_size(*estimated_savings_bytes)
                ),
                how_to_undo: format!("Remove `Read({pattern})` from permissions.deny"),
            },
            SuggestionPayload::Workflow { name, commands, .. } => ChangePreview {
                what_will_change: format!(
                    "Create .claude/commands/{name}.md running {} steps",
                    commands.len()
                ),
                consequences: format!("A new `/{name}` slash command becomes available"),
                how_to_undo: format!("Delete .claude/commands/{name}.md"),
            },
            SuggestionPayload::InstructionImprovement { section, .. } => ChangePreview {
                what_will_change: format!("Append a `{section}` section to CLAUDE.md"),
                consequences: "The assistant reads the new guidance at session start".to_string(),
                how_to_undo: format!("Delete the `{section}` section from CLAUDE.md"),
            },
            SuggestionPayload::CrossProjectTransfer {
                source_project,
                section,
                ..
            } => ChangePreview {
                what_will_change: format!(
                    "Append `{section}` (learned in {source_project}) to CLAUDE.md"
                ),
                consequences: "Guidance proven in another project applies here too".to_string(),
                how_to_undo: format!("Delete the `{section}` section from CLAUDE.md"),
            },
        }
    }
}
