//! Cancellation boundary middleware.
//!
//! # Responsibilities
//! - Bind a fresh [`CancellationHandle`] to every request
//! - Cancel it when the request is abandoned (client gone, outer timeout)
//!   or when the server shuts down
//! - Turn a handler's cancellation into `499 Request was cancelled.`
//!
//! # Design Decisions
//! - The handler runs on its own task. Dropping the request future only
//!   cancels the handle; the handler decides whether to stop.
//! - Only responses tagged [`RequestCancelled`] are rewritten. Every other
//!   response, and every service error, passes through untouched.
//! - Once the handler has returned a response its head is on the way to the
//!   client. A cancellation after that point can only shorten the body;
//!   streaming bodies end quietly and nothing is rewritten here.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};

use crate::cancellation::handle::CancellationHandle;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

/// Status used for requests abandoned by cancellation ("client closed request").
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Body of the response produced for a cancelled request.
pub const CANCELLED_BODY: &str = "Request was cancelled.";

/// Response extension marking "this handler stopped because its handle was
/// cancelled". Set by the `IntoResponse` impl of the cancellation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCancelled;

/// `499` status code.
pub fn client_closed_status() -> StatusCode {
    StatusCode::from_u16(CLIENT_CLOSED_REQUEST).expect("499 is within the valid status range")
}

/// The response sent for a request whose handler was cancelled before it
/// produced anything.
pub fn cancelled_response() -> Response {
    (client_closed_status(), CANCELLED_BODY).into_response()
}

/// Tower layer installing the [`CancellationBoundary`] around a service.
#[derive(Debug, Clone)]
pub struct CancellationBoundaryLayer {
    shutdown: CancellationToken,
}

impl CancellationBoundaryLayer {
    /// Request handles become children of `shutdown`: cancelling it cancels
    /// every in-flight request.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

impl<S> Layer<S> for CancellationBoundaryLayer {
    type Service = CancellationBoundary<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CancellationBoundary {
            inner,
            shutdown: self.shutdown.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancellationBoundary<S> {
    inner: S,
    shutdown: CancellationToken,
}

impl<S> Service<Request> for CancellationBoundary<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let token = self.shutdown.child_token();
        req.extensions_mut()
            .insert(CancellationHandle::new(token.clone()));

        let request_id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        // The clone has not been driven to readiness; keep the ready one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let handler = tokio::spawn(inner.call(req));

        // Dropped with the returned future if the request is abandoned first.
        let abandon = token.drop_guard();

        Box::pin(async move {
            let outcome = handler.await;
            abandon.disarm();

            match outcome {
                Ok(Ok(response)) if response.extensions().get::<RequestCancelled>().is_some() => {
                    tracing::info!(request_id = %request_id, "Request cancelled before response started");
                    metrics::record_boundary_conversion();
                    Ok(cancelled_response())
                }
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    tracing::warn!(request_id = %request_id, error = %e, "Handler task aborted");
                    metrics::record_boundary_conversion();
                    Ok(cancelled_response())
                }
            }
        })
    }
}
