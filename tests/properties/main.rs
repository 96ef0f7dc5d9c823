//! Property tests entry point.

mod calibration_tests;
mod determinism_tests;
mod approval_tests;
