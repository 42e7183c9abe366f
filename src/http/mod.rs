//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (correlation id, request span)
//!     → cancellation boundary (per-request handle)
//!     → handlers.rs (parse input, run the sequencer)
//!     → response.rs (JSON message, 400, tagged 499)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::AppState;
pub use request::{CorrelationId, MakeCorrelationId, X_REQUEST_ID};
pub use server::HttpServer;
