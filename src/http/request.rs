//! Request correlation.
//!
//! # Responsibilities
//! - Generate a correlation id (UUID v4) for requests that arrive without one
//! - Expose it to handlers and to the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept as-is

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 correlation ids for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The correlation id of the current request, `"unknown"` if none was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    fn from_parts(parts: &Parts) -> Self {
        let from_extension = parts
            .extensions
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok());
        let from_header = || {
            parts
                .headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        };

        Self(
            from_extension
                .or_else(from_header)
                .unwrap_or("unknown")
                .to_string(),
        )
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Span wrapping every request, tagged with its correlation id.
pub fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract(request: Request) -> CorrelationId {
        let (mut parts, _) = request.into_parts();
        CorrelationId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn prefers_request_id_extension() {
        let mut request = Request::new(Body::empty());
        request
            .extensions_mut()
            .insert(RequestId::new(HeaderValue::from_static("from-layer")));
        request
            .headers_mut()
            .insert(X_REQUEST_ID, HeaderValue::from_static("from-header"));

        assert_eq!(extract(request).await, CorrelationId("from-layer".into()));
    }

    #[tokio::test]
    async fn falls_back_to_header_then_unknown() {
        let mut request = Request::new(Body::empty());
        request
            .headers_mut()
            .insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(extract(request).await, CorrelationId("abc".into()));

        assert_eq!(
            extract(Request::new(Body::empty())).await,
            CorrelationId("unknown".into())
        );
    }

    #[test]
    fn generated_ids_are_uuids() {
        let request = Request::new(Body::empty());
        let id = MakeCorrelationId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
