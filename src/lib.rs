//! config-learn: adaptive suggestion pipeline for assistant configuration.
//!
//! Analyzers drop candidate improvements per category; a run collects them,
//! asks the operator to approve each one, applies the approved changes to the
//! project, remembers rejections, and recalibrates detection thresholds from
//! how often suggestions were accepted.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod learning;
pub mod suggestions;
pub mod test_utils;
pub mod utils;

pub use error::{LearnError, Result};
