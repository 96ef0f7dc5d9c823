//! Utility functions and helpers.

pub mod format;
pub mod fs;
pub mod time;

// Re-exports for convenience
pub use format::*;
pub use fs::*;
pub use time::window_start;
