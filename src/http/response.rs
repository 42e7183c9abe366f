//! Response shaping.
//!
//! - `ResponseMessage` → `200 OK` JSON `{"message": ...}`
//! - `InvalidArgument` → `400` plain text
//! - `CancellationRequested` → `499` tagged for the cancellation boundary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::cancellation::{cancelled_response, RequestCancelled};
use crate::sequencer::{ResponseMessage, SequenceError};

impl IntoResponse for ResponseMessage {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for SequenceError {
    fn into_response(self) -> Response {
        match self {
            SequenceError::CancellationRequested => {
                let mut response = cancelled_response();
                response.extensions_mut().insert(RequestCancelled);
                response
            }
            SequenceError::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
        }
    }
}
