//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, cancellation boundary)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cancellation::CancellationBoundaryLayer;
use crate::config::ServiceConfig;
use crate::http::handlers::{self, AppState};
use crate::http::request::{request_span, MakeCorrelationId};
use crate::lifecycle::Shutdown;
use crate::sequencer::TaskSequencer;

/// HTTP server for the long-running endpoints.
pub struct HttpServer {
    router: Router,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server. Triggering `shutdown` cancels every
    /// in-flight request and stops the server.
    pub fn new(config: &ServiceConfig, shutdown: Shutdown) -> Self {
        let router = Self::build_router(config, &shutdown);
        Self { router, shutdown }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request id → trace span → id propagation →
    /// timeout → cancellation boundary → handlers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, shutdown: &Shutdown) -> Router {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            sequencer: Arc::new(TaskSequencer::new(&config.sequencer, request_timeout)),
        };

        Router::new()
            .route(
                "/LongRunning/WithoutCancellationToken",
                get(handlers::without_cancellation_token),
            )
            .route(
                "/LongRunning/WithCancellationToken",
                get(handlers::with_cancellation_token),
            )
            .route("/LongRunning/Streaming", get(handlers::streaming))
            .with_state(state)
            .layer(CancellationBoundaryLayer::new(shutdown.token()))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeCorrelationId))
    }

    /// Run the server, accepting connections on the given listener until
    /// shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn fast_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.sequencer.default_delays_ms = vec![1, 1];
        config.sequencer.step_duration_ms = 1;
        config
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn without_cancellation_returns_message_and_request_id() {
        let router = HttpServer::build_router(&fast_config(), &Shutdown::new());

        let response = router
            .oneshot(get("/LongRunning/WithoutCancellationToken"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            body_text(response).await,
            r#"{"message":"Request completed successfully."}"#
        );
    }

    #[tokio::test]
    async fn without_cancellation_ignores_a_cancelled_server() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let router = HttpServer::build_router(&fast_config(), &shutdown);

        let request = Request::get("/LongRunning/WithoutCancellationToken")
            .body(Body::from("[1, 1, 1]"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn with_cancellation_succeeds() {
        let router = HttpServer::build_router(&fast_config(), &Shutdown::new());

        let response = router
            .oneshot(get("/LongRunning/WithCancellationToken?totalSteps=2&stepDurationMs=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"{"message":"Long-running request completed successfully."}"#
        );
    }

    #[tokio::test]
    async fn with_cancellation_on_cancelled_server_is_499() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let router = HttpServer::build_router(&fast_config(), &shutdown);

        let response = router
            .oneshot(get("/LongRunning/WithCancellationToken"))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 499);
        assert_eq!(body_text(response).await, "Request was cancelled.");
    }

    #[tokio::test]
    async fn negative_input_is_bad_request() {
        let router = HttpServer::build_router(&fast_config(), &Shutdown::new());

        for uri in [
            "/LongRunning/WithCancellationToken?stepDurationMs=-5",
            "/LongRunning/WithCancellationToken?totalSteps=-1",
            "/LongRunning/WithCancellationToken?totalSteps=abc",
            "/LongRunning/WithoutCancellationToken?delays=10,-3",
            "/LongRunning/Streaming?totalSteps=-2",
        ] {
            let response = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn streaming_emits_progress_lines() {
        let router = HttpServer::build_router(&fast_config(), &Shutdown::new());

        let response = router
            .oneshot(get("/LongRunning/Streaming?totalSteps=3&stepDurationMs=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "1/3\n2/3\n3/3\n");
    }

    fn thirty_second_timeout() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = 30;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn without_cancellation_run_must_fit_request_timeout() {
        let router = HttpServer::build_router(&thirty_second_timeout(), &Shutdown::new());

        let too_long = Request::get("/LongRunning/WithoutCancellationToken")
            .body(Body::from("[20000, 20000]"))
            .unwrap();
        let response = router.clone().oneshot(too_long).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("request timeout"));

        let just_fits = Request::get("/LongRunning/WithoutCancellationToken")
            .body(Body::from("[20000, 9000]"))
            .unwrap();
        let response = router.oneshot(just_fits).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn with_cancellation_run_must_fit_request_timeout() {
        let router = HttpServer::build_router(&thirty_second_timeout(), &Shutdown::new());

        let response = router
            .clone()
            .oneshot(get("/LongRunning/WithCancellationToken?totalSteps=40&stepDurationMs=1000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(get("/LongRunning/WithCancellationToken?totalSteps=29&stepDurationMs=1000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn client_request_id_is_echoed() {
        let router = HttpServer::build_router(&fast_config(), &Shutdown::new());

        let request = Request::get("/LongRunning/WithCancellationToken?totalSteps=0")
            .header("x-request-id", "client-42")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "client-42");
    }
}
