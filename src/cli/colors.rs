//! Semantic colors for config-learn output.
//!
//! Respects `NO_COLOR`, `FORCE_COLOR`, `TERM=dumb` and piped stdout.

use colored::{ColoredString, Colorize};
use std::io::IsTerminal;

use crate::suggestions::{Priority, SuggestionCategory};

// ============================================================================
// Color Support Detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    /// NO_COLOR set, TERM=dumb, or piped output
    None,
    Basic,
}

impl ColorSupport {
    #[must_use]
    pub fn detect() -> Self {
        Self::from_env(
            std::env::var_os("NO_COLOR").is_some(),
            std::env::var_os("FORCE_COLOR").is_some(),
            std::io::stdout().is_terminal(),
            std::env::var("TERM").ok().as_deref(),
        )
    }

    /// Decision table behind [`Self::detect`].
    #[must_use]
    pub fn from_env(no_color: bool, force_color: bool, is_tty: bool, term: Option<&str>) -> Self {
        if no_color {
            return Self::None;
        }
        if force_color {
            return Self::Basic;
        }
        if !is_tty || term == Some("dumb") {
            return Self::None;
        }
        Self::Basic
    }

    #[must_use]
    pub const fn has_color(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for ColorSupport {
    fn default() -> Self {
        Self::detect()
    }
}

// ============================================================================
// Pre-built Styles
// ============================================================================

pub struct LearnStyles;

impl LearnStyles {
    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    /// High priority is red, low priority fades out.
    pub fn priority(text: &str, priority: Priority) -> ColoredString {
        match priority.get() {
            1 => text.red().bold(),
            2 => text.yellow(),
            _ => text.cyan(),
        }
    }

    pub fn category(category: SuggestionCategory) -> ColoredString {
        let label = category.label();
        match category {
            SuggestionCategory::Permission => label.green(),
            SuggestionCategory::McpOptimization => label.blue(),
            SuggestionCategory::ContextOptimization => label.magenta(),
            SuggestionCategory::Workflow => label.cyan(),
            SuggestionCategory::InstructionImprovement => label.yellow(),
            SuggestionCategory::CrossProjectTransfer => label.bright_blue(),
        }
        .bold()
    }

    pub fn check() -> ColoredString {
        "✓".green().bold()
    }

    pub fn cross() -> ColoredString {
        "✗".red().bold()
    }

    pub fn exclaim() -> ColoredString {
        "!".yellow()
    }
}

// ============================================================================
// Conditional Styling
// ============================================================================

/// Apply `style_fn` only when the terminal supports color.
pub fn styled<S, F>(text: S, style_fn: F, support: ColorSupport) -> String
where
    S: AsRef<str>,
    F: FnOnce(&str) -> ColoredString,
{
    if support.has_color() {
        style_fn(text.as_ref()).to_string()
    } else {
        text.as_ref().to_string()
    }
}

pub fn with_color<S: AsRef<str>>(colored: ColoredString, plain: S, support: ColorSupport) -> String {
    if support.has_color() {
        colored.to_string()
    } else {
        plain.as_ref().to_string()
    }
}

/// Check, cross, or exclamation mark.
#[must_use]
pub fn format_status(success: Option<bool>, support: ColorSupport) -> String {
    match success {
        Some(true) => with_color(LearnStyles::check(), "✓", support),
        Some(false) => with_color(LearnStyles::cross(), "✗", support),
        None => with_color(LearnStyles::exclaim(), "!", support),
    }
}

/// `P1`..`P3` label.
#[must_use]
pub fn format_priority(priority: Priority, support: ColorSupport) -> String {
    let label = format!("P{}", priority.get());
    if support.has_color() {
        LearnStyles::priority(&label, priority).to_string()
    } else {
        label
    }
}

#[must_use]
pub fn format_category(category: SuggestionCategory, support: ColorSupport) -> String {
    with_color(LearnStyles::category(category), category.label(), support)
}
