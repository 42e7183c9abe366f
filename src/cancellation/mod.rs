//! Request cancellation subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown root token
//!     → boundary.rs (child token per request, drop guard on the request future)
//!     → handle.rs (CancellationHandle extractor handed to the handler)
//!     → handler observes or ignores it
//!     → boundary.rs (cancelled handler → 499, anything else unchanged)
//! ```

pub mod boundary;
pub mod handle;

pub use boundary::{
    cancelled_response, client_closed_status, CancellationBoundary, CancellationBoundaryLayer,
    RequestCancelled, CANCELLED_BODY, CLIENT_CLOSED_REQUEST,
};
pub use handle::CancellationHandle;
