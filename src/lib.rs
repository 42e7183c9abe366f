//! Cooperative cancellation for long-running HTTP handlers.
//!
//! A request runs a chain of delayed sub-tasks. The cancellation-aware
//! endpoint stops as soon as its client disconnects or the server shuts
//! down; the cancellation-unaware one always runs to the end.

pub mod cancellation;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod sequencer;

pub use cancellation::{CancellationBoundaryLayer, CancellationHandle};
pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use sequencer::{ResponseMessage, SequenceError, TaskSequencer};
