//! Error types for config-learn.

use thiserror::Error;

use crate::suggestions::SuggestionCategory;

pub type Result<T> = std::result::Result<T, LearnError>;

#[derive(Debug, Error)]
pub enum LearnError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid suggestion: {0}")]
    InvalidSuggestion(String),

    /// One analyzer failed; its category degrades to an empty list.
    #[error("suggestion source for {category} failed: {message}")]
    SourceFailure {
        category: SuggestionCategory,
        message: String,
    },

    /// Rejection log or threshold state could not be written.
    #[error("failed to persist {artifact}: {message}")]
    PersistenceFailure { artifact: String, message: String },

    #[error("failed to apply {category} change: {message}")]
    ApplicationFailure {
        category: SuggestionCategory,
        message: String,
    },

    #[error("no handler registered for {0}")]
    NoHandler(SuggestionCategory),
}

impl LearnError {
    pub fn persistence(artifact: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::PersistenceFailure {
            artifact: artifact.into(),
            message: err.to_string(),
        }
    }

    pub fn application(category: SuggestionCategory, err: impl std::fmt::Display) -> Self {
        Self::ApplicationFailure {
            category,
            message: err.to_string(),
        }
    }

    /// Short machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Json(_) => "serialization",
            Self::InvalidSuggestion(_) => "invalid_suggestion",
            Self::SourceFailure { .. } => "source_failure",
            Self::PersistenceFailure { .. } => "persistence_failure",
            Self::ApplicationFailure { .. } | Self::NoHandler(_) => "application_failure",
        }
    }
}
