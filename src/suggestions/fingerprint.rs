//! Content fingerprints for recognizing recurring suggestions across runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LearnError, Result};

use super::types::{McpAction, SuggestionCategory, SuggestionPayload};

/// Hex characters kept from the SHA-256 digest.
const FINGERPRINT_LEN: usize = 32;

/// Deterministic identifier derived from a suggestion's semantic content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// The fields that name a suggestion, without the counts and estimates that
/// drift between runs as the analyzed logs grow.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Identity<'a> {
    Permission {
        rule: &'a str,
    },
    McpOptimization {
        server: &'a str,
        action: McpAction,
    },
    ContextOptimization {
        pattern: &'a str,
    },
    Workflow {
        name: &'a str,
        commands: Vec<&'a str>,
    },
    InstructionImprovement {
        section: &'a str,
        text: &'a str,
    },
    CrossProjectTransfer {
        source_project: &'a str,
        section: &'a str,
        text: &'a str,
    },
}

impl<'a> From<&'a SuggestionPayload> for Identity<'a> {
    fn from(payload: &'a SuggestionPayload) -> Self {
        match payload {
            SuggestionPayload::Permission { rule, .. } => Self::Permission { rule: rule.trim() },
            SuggestionPayload::McpOptimization { server, action, .. } => Self::McpOptimization {
                server: server.trim(),
                action: *action,
            },
            SuggestionPayload::ContextOptimization { pattern, .. } => Self::ContextOptimization {
                pattern: pattern.trim(),
            },
            SuggestionPayload::Workflow { name, commands, .. } => Self::Workflow {
                name: name.trim(),
                commands: commands.iter().map(|c| c.trim()).collect(),
            },
            SuggestionPayload::InstructionImprovement { section, text } => {
                Self::InstructionImprovement {
                    section: section.trim(),
                    text: text.trim(),
                }
            }
            SuggestionPayload::CrossProjectTransfer {
                source_project,
                section,
                text,
            } => Self::CrossProjectTransfer {
                source_project: source_project.trim(),
                section: section.trim(),
                text: text.trim(),
            },
        }
    }
}

#[derive(Serialize)]
struct CanonicalContent<'a> {
    category: SuggestionCategory,
    identity: Identity<'a>,
}

impl Fingerprint {
    /// Hash the canonical JSON of the category and the payload's identity.
    ///
    /// Occurrence counts, size estimates and the description are left out, so
    /// a suggestion keeps its fingerprint while the analyzer's numbers change.
    pub fn compute(category: SuggestionCategory, payload: &SuggestionPayload) -> Result<Self> {
        let canonical = serde_json::to_vec(&CanonicalContent {
            category,
            identity: Identity::from(payload),
        })
        .map_err(|err| LearnError::Serialization(format!("fingerprint content: {err}")))?;
        let digest = Sha256::digest(&canonical);
        let mut encoded = hex::encode(digest);
        encoded.truncate(FINGERPRINT_LEN);
        Ok(Self(encoded))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(commands: &[&str], occurrences: u32) -> SuggestionPayload {
        SuggestionPayload::Workflow {
            name: "ship".to_string(),
            commands: commands.iter().map(|c| (*c).to_string()).collect(),
            occurrences,
        }
    }

    fn permission(occurrences: u32) -> SuggestionPayload {
        SuggestionPayload::Permission {
            rule: "Bash(cargo test:*)".to_string(),
            occurrences,
        }
    }

    #[test]
    fn same_content_same_fingerprint() {
        let a = Fingerprint::compute(
            SuggestionCategory::Workflow,
            &workflow(&["cargo fmt", "cargo test"], 5),
        )
        .unwrap();
        let b = Fingerprint::compute(
            SuggestionCategory::Workflow,
            &workflow(&["cargo fmt ", " cargo test"], 5),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), FINGERPRINT_LEN);
    }

    #[test]
    fn content_changes_fingerprint() {
        let a = Fingerprint::compute(
            SuggestionCategory::Workflow,
            &workflow(&["cargo fmt", "cargo test"], 5),
        )
        .unwrap();
        let b = Fingerprint::compute(
            SuggestionCategory::Workflow,
            &workflow(&["cargo test", "cargo fmt"], 5),
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn counts_do_not_change_fingerprint() {
        let a = Fingerprint::compute(SuggestionCategory::Permission, &permission(4)).unwrap();
        let b = Fingerprint::compute(SuggestionCategory::Permission, &permission(5)).unwrap();
        assert_eq!(a, b);

        let mcp = |estimated_tokens| SuggestionPayload::McpOptimization {
            server: "browser".to_string(),
            action: McpAction::Disable,
            estimated_tokens,
        };
        assert_eq!(
            Fingerprint::compute(SuggestionCategory::McpOptimization, &mcp(1_200)).unwrap(),
            Fingerprint::compute(SuggestionCategory::McpOptimization, &mcp(9_000)).unwrap()
        );
    }

    #[test]
    fn mcp_action_is_part_of_identity() {
        let mcp = |action| SuggestionPayload::McpOptimization {
            server: "browser".to_string(),
            action,
            estimated_tokens: 500,
        };
        assert_ne!(
            Fingerprint::compute(SuggestionCategory::McpOptimization, &mcp(McpAction::Disable))
                .unwrap(),
            Fingerprint::compute(SuggestionCategory::McpOptimization, &mcp(McpAction::Review))
                .unwrap()
        );
    }

    #[test]
    fn description_does_not_change_fingerprint() {
        let a = crate::suggestions::Suggestion::new(
            "allow cargo test (seen 4 times)",
            crate::suggestions::Priority::HIGH,
            permission(4),
        )
        .unwrap();
        let b = crate::suggestions::Suggestion::new(
            "allow cargo test (seen 5 times)",
            crate::suggestions::Priority::HIGH,
            permission(5),
        )
        .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
