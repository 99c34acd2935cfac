//! Typed errors that cross the orchestration boundary.
//!
//! Only input errors (`TurnError`) propagate to the caller; every other
//! failure class is absorbed into a best-effort response. Validation
//! rejections are typed so the strategy chain can distinguish them from
//! provider errors.

use thiserror::Error;

/// Fatal input errors for a single turn. The only error category that
/// `AgentEngine::process_turn` surfaces to its caller.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("message cannot be empty")]
    EmptyMessage,
}

/// Structural-contract violations detected by the response validator.
/// A rejection advances the strategy chain; it is never a panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("response message is empty")]
    EmptyMessage,

    #[error("response has no reasoning steps")]
    NoReasoningSteps,

    #[error("reasoning step {step} has confidence {value} outside [0, 1]")]
    StepConfidenceOutOfRange { step: u32, value: f32 },

    #[error("overall confidence {value} outside [0, 1]")]
    OverallConfidenceOutOfRange { value: f32 },
}
