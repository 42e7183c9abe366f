//! Results produced by a sequencer run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned once the cancellation-unaware sequence finishes.
pub const WITHOUT_CANCELLATION_COMPLETED: &str = "Request completed successfully.";

/// Message returned once the cancellation-aware sequence finishes.
pub const WITH_CANCELLATION_COMPLETED: &str = "Long-running request completed successfully.";

/// Outcome of a fully completed sequence. Never built for a partial run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub message: String,
}

impl ResponseMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that stop a sequence before it produces a [`ResponseMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The cancellation handle fired before or during a step.
    #[error("cancellation requested")]
    CancellationRequested,

    /// Input rejected before any step ran.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SequenceError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SequenceError::CancellationRequested)
    }
}
