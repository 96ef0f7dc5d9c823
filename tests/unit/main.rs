//! Unit-level tests against the public API.

mod config_tests;
mod report_tests;
