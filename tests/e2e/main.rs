//! E2E test suite entry point.

mod fixture;
mod learning_workflow;
