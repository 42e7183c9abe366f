//! `/LongRunning/*` endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::cancellation::CancellationHandle;
use crate::http::request::CorrelationId;
use crate::sequencer::{ResponseMessage, SequenceError, TaskSequencer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub sequencer: Arc<TaskSequencer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DelaysQuery {
    /// Comma-separated milliseconds, e.g. `1000,2000`.
    pub delays: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsQuery {
    pub total_steps: Option<i64>,
    pub step_duration_ms: Option<i64>,
}

/// GET /LongRunning/WithoutCancellationToken
///
/// Deliberately takes no [`CancellationHandle`].
pub async fn without_cancellation_token(
    State(state): State<AppState>,
    CorrelationId(id): CorrelationId,
    query: Result<Query<DelaysQuery>, QueryRejection>,
    body: Bytes,
) -> Result<ResponseMessage, SequenceError> {
    let Query(query) = query.map_err(invalid_query)?;
    let raw = requested_delays(query.delays.as_deref(), &body)?;
    let delays = state.sequencer.delays(&raw)?;

    Ok(state.sequencer.run_without_cancellation(&id, delays).await)
}

/// GET /LongRunning/WithCancellationToken
pub async fn with_cancellation_token(
    State(state): State<AppState>,
    CorrelationId(id): CorrelationId,
    cancellation: CancellationHandle,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<ResponseMessage, SequenceError> {
    let Query(query) = query.map_err(invalid_query)?;
    let plan = state.sequencer.plan(query.total_steps, query.step_duration_ms)?;

    state
        .sequencer
        .run_with_cancellation(&id, &cancellation, plan)
        .await
}

/// GET /LongRunning/Streaming
///
/// Sends `200 OK` immediately, then one `i/total` line per completed step.
pub async fn streaming(
    State(state): State<AppState>,
    CorrelationId(id): CorrelationId,
    cancellation: CancellationHandle,
    query: Result<Query<StepsQuery>, QueryRejection>,
) -> Result<Response, SequenceError> {
    let Query(query) = query.map_err(invalid_query)?;
    let plan = state.sequencer.plan(query.total_steps, query.step_duration_ms)?;

    if cancellation.is_cancelled() {
        return Err(SequenceError::CancellationRequested);
    }

    let lines = TaskSequencer::progress_stream(id, cancellation.into_token(), plan)
        .map(|step| Ok::<_, Infallible>(format!("{}\n", step.progress())));

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(lines),
    )
        .into_response())
}

fn invalid_query(rejection: QueryRejection) -> SequenceError {
    SequenceError::InvalidArgument(rejection.body_text())
}

/// Raw delays from a JSON array body, else from the `delays` query value.
/// Neither present (or JSON `null`) means "no input".
fn requested_delays(query: Option<&str>, body: &[u8]) -> Result<Vec<i64>, SequenceError> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice::<Option<Vec<i64>>>(body)
            .map(Option::unwrap_or_default)
            .map_err(|e| SequenceError::InvalidArgument(format!("delays body: {e}")));
    }

    match query.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(list) => list
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i64>().map_err(|_| {
                    SequenceError::InvalidArgument(format!("delays: '{part}' is not an integer"))
                })
            })
            .collect(),
    }
}
