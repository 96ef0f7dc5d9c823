//! Built-in category handlers that edit a project's assistant configuration.
//!
//! Layout under the project root:
//!
//! ```text
//! <project>/
//! ├── CLAUDE.md                        # instruction + cross-project sections
//! └── .claude/
//!     ├── settings.local.json          # permissions, disabled MCP servers
//!     └── commands/<name>.md           # workflow slash commands
//! ```
//!
//! Every handler is idempotent: applying the same suggestion twice leaves the
//! files as after the first application.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{LearnError, Result};
use crate::suggestions::{Suggestion, SuggestionCategory, SuggestionPayload};
use crate::utils::{read_optional, write_atomic};

use super::applicator::CategoryHandler;

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(".claude").join("settings.local.json")
    }

    #[must_use]
    pub fn command_path(&self, name: &str) -> PathBuf {
        self.root
            .join(".claude")
            .join("commands")
            .join(format!("{name}.md"))
    }

    #[must_use]
    pub fn instructions_path(&self) -> PathBuf {
        self.root.join("CLAUDE.md")
    }
}

/// One handler per category, all rooted at `layout`.
#[must_use]
pub fn default_handlers(layout: &ProjectLayout) -> Vec<Box<dyn CategoryHandler>> {
    vec![
        Box::new(SettingsListHandler::new(
            SuggestionCategory::Permission,
            layout.clone(),
        )),
        Box::new(SettingsListHandler::new(
            SuggestionCategory::McpOptimization,
            layout.clone(),
        )),
        Box::new(SettingsListHandler::new(
            SuggestionCategory::ContextOptimization,
            layout.clone(),
        )),
        Box::new(WorkflowCommandHandler::new(layout.clone())),
        Box::new(InstructionsHandler::new(
            SuggestionCategory::InstructionImprovement,
            layout.clone(),
        )),
        Box::new(InstructionsHandler::new(
            SuggestionCategory::CrossProjectTransfer,
            layout.clone(),
        )),
    ]
}

fn mismatch(category: SuggestionCategory, suggestion: &Suggestion) -> LearnError {
    LearnError::application(
        category,
        format!("{} suggestion routed to {category} handler", suggestion.category()),
    )
}

const ALLOW_KEYS: &[&str] = &["permissions", "allow"];
const DENY_KEYS: &[&str] = &["permissions", "deny"];
const DISABLED_MCP_KEYS: &[&str] = &["disabledMcpjsonServers"];

/// Adds a unique string to a list inside `settings.local.json`.
pub struct SettingsListHandler {
    category: SuggestionCategory,
    layout: ProjectLayout,
}

impl SettingsListHandler {
    #[must_use]
    pub const fn new(category: SuggestionCategory, layout: ProjectLayout) -> Self {
        Self { category, layout }
    }

    fn target(&self, suggestion: &Suggestion) -> Result<(&'static [&'static str], String)> {
        match suggestion.payload() {
            SuggestionPayload::Permission { rule, .. } => Ok((ALLOW_KEYS, rule.clone())),
            SuggestionPayload::McpOptimization { server, .. } => {
                Ok((DISABLED_MCP_KEYS, server.clone()))
            }
            SuggestionPayload::ContextOptimization { pattern, .. } => {
                Ok((DENY_KEYS, format!("Read({pattern})")))
            }
            _ => Err(mismatch(self.category, suggestion)),
        }
    }

    fn load_settings(&self, path: &Path) -> Result<Value> {
        match read_optional(path)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw).map_err(|err| {
                LearnError::application(self.category, format!("parse {}: {err}", path.display()))
            }),
            _ => Ok(Value::Object(Map::new())),
        }
    }
}

/// Walk `keys` creating objects, and return the array at the end.
fn list_at<'a>(root: &'a mut Value, keys: &[&str]) -> Option<&'a mut Vec<Value>> {
    let (last, parents) = keys.split_last()?;
    let mut node = root;
    for key in parents {
        node = node
            .as_object_mut()?
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    node.as_object_mut()?
        .entry((*last).to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
}

impl CategoryHandler for SettingsListHandler {
    fn category(&self) -> SuggestionCategory {
        self.category
    }

    fn apply(&self, suggestion: &Suggestion, dry_run: bool) -> Result<String> {
        if suggestion.category() != self.category {
            return Err(mismatch(self.category, suggestion));
        }
        let (keys, entry) = self.target(suggestion)?;
        let path = self.layout.settings_path();
        let key_path = keys.join(".");

        let mut settings = self.load_settings(&path)?;
        let list = list_at(&mut settings, keys).ok_or_else(|| {
            LearnError::application(
                self.category,
                format!("{key_path} in {} is not a list", path.display()),
            )
        })?;
        if list.iter().any(|v| v.as_str() == Some(entry.as_str())) {
            return Ok(format!("`{entry}` already in {key_path}"));
        }
        if dry_run {
            return Ok(format!("would add `{entry}` to {key_path}"));
        }
        list.push(Value::String(entry.clone()));

        let payload = serde_json::to_string_pretty(&settings)?;
        write_atomic(&path, payload.as_bytes())
            .map_err(|err| LearnError::application(self.category, err))?;
        Ok(format!("added `{entry}` to {key_path}"))
    }
}

/// Writes a slash command file for a repeated command sequence.
pub struct WorkflowCommandHandler {
    layout: ProjectLayout,
}

impl WorkflowCommandHandler {
    #[must_use]
    pub const fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }
}

fn render_command(description: &str, commands: &[String]) -> String {
    let mut out = format!("---\ndescription: {description}\n---\n\nRun these steps in order:\n\n");
    for (idx, command) in commands.iter().enumerate() {
        out.push_str(&format!("{}. `{command}`\n", idx + 1));
    }
    out
}

impl CategoryHandler for WorkflowCommandHandler {
    fn category(&self) -> SuggestionCategory {
        SuggestionCategory::Workflow
    }

    fn apply(&self, suggestion: &Suggestion, dry_run: bool) -> Result<String> {
        let SuggestionPayload::Workflow { name, commands, .. } = suggestion.payload() else {
            return Err(mismatch(SuggestionCategory::Workflow, suggestion));
        };
        let path = self.layout.command_path(name);
        let body = render_command(suggestion.description(), commands);

        if let Some(existing) = read_optional(&path)? {
            if existing == body {
                return Ok(format!("/{name} already present"));
            }
            return Err(LearnError::application(
                SuggestionCategory::Workflow,
                format!("{} exists with different content", path.display()),
            ));
        }
        if dry_run {
            return Ok(format!("would create {}", path.display()));
        }
        write_atomic(&path, body.as_bytes())
            .map_err(|err| LearnError::application(SuggestionCategory::Workflow, err))?;
        Ok(format!("created /{name}"))
    }
}

/// Appends a guidance section to `CLAUDE.md`.
pub struct InstructionsHandler {
    category: SuggestionCategory,
    layout: ProjectLayout,
}

impl InstructionsHandler {
    #[must_use]
    pub const fn new(category: SuggestionCategory, layout: ProjectLayout) -> Self {
        Self { category, layout }
    }
}

impl CategoryHandler for InstructionsHandler {
    fn category(&self) -> SuggestionCategory {
        self.category
    }

    fn apply(&self, suggestion: &Suggestion, dry_run: bool) -> Result<String> {
        if suggestion.category() != self.category {
            return Err(mismatch(self.category, suggestion));
        }
        let (section, text, origin) = match suggestion.payload() {
            SuggestionPayload::InstructionImprovement { section, text } => (section, text, None),
            SuggestionPayload::CrossProjectTransfer {
                source_project,
                section,
                text,
            } => (section, text, Some(source_project)),
            _ => return Err(mismatch(self.category, suggestion)),
        };

        let path = self.layout.instructions_path();
        let mut document = read_optional(&path)?.unwrap_or_default();
        if document.contains(text.trim()) {
            return Ok(format!("`{section}` guidance already in CLAUDE.md"));
        }
        if dry_run {
            return Ok(format!("would append `{section}` to CLAUDE.md"));
        }

        if !document.is_empty() && !document.ends_with('\n') {
            document.push('\n');
        }
        if !document.is_empty() {
            document.push('\n');
        }
        document.push_str(&format!("## {section}\n\n"));
        if let Some(project) = origin {
            document.push_str(&format!("_Transferred from {project}._\n\n"));
        }
        document.push_str(text.trim());
        document.push('\n');

        write_atomic(&path, document.as_bytes())
            .map_err(|err| LearnError::application(self.category, err))?;
        Ok(format!("appended `{section}` to CLAUDE.md"))
    }
}
