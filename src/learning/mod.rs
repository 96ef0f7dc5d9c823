//! Approval, rejection memory, application and threshold calibration.

pub mod applicator;
pub mod approval;
pub mod calibrator;
pub mod handlers;
pub mod orchestrator;
pub mod rejections;
pub mod report;
pub mod threshold_storage;

pub use applicator::{AppliedItem, Applicator, ApplyResult, CategoryHandler, FailedItem};
pub use approval::{
    ApprovalDecision, ApprovalInput, ApprovalIo, ApprovalOutcome, ApprovalState,
    ApprovalWorkflow, DecisionOutcome, PromptItem,
};
pub use calibrator::{
    CategoryThresholds, ControllerAction, OutcomeRecord, ThresholdCalibrator, ThresholdParameter,
    ThresholdState, acceptance_rate,
};
pub use handlers::{ProjectLayout, default_handlers};
pub use orchestrator::{
    CalibrationStatus, Orchestrator, RunOptions, RunOutcome, RunSummary, ThresholdOverrides,
};
pub use rejections::{CompactionStats, RejectionMemory, RejectionRecord};
pub use report::{LearningReport, NO_IMPROVEMENTS};
