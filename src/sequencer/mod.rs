//! Task sequencing subsystem.
//!
//! # Data Flow
//! ```text
//! request input (delays / totalSteps, stepDurationMs)
//!     → steps.rs (DelaySpec / StepPlan, validated against config limits)
//!     → runner.rs (TaskSequencer: one TaskStep at a time, logged on completion)
//!     → outcome.rs (ResponseMessage on success, SequenceError otherwise)
//! ```
//!
//! # Variants
//! - `run_without_cancellation`: never looks at a cancellation handle
//! - `run_with_cancellation`: races every wait against the handle
//! - `progress_stream`: the same, yielding steps for a streamed response

pub mod outcome;
pub mod runner;
pub mod steps;

pub use outcome::{
    ResponseMessage, SequenceError, WITHOUT_CANCELLATION_COMPLETED, WITH_CANCELLATION_COMPLETED,
};
pub use runner::TaskSequencer;
pub use steps::{DelaySpec, StepPlan, TaskStep};
