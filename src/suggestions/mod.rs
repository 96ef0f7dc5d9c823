//! Suggestions: data model, fingerprints, and sources.

pub mod candidates;
pub mod fingerprint;
pub mod source;
pub mod types;

pub use candidates::{CandidateFileSource, CandidateRecord};
pub use fingerprint::Fingerprint;
pub use source::{RejectionFilter, SourceRegistry, SourceRequest, SuggestionSource};
pub use types::{
    ChangePreview, McpAction, Priority, Suggestion, SuggestionCategory, SuggestionPayload,
};
