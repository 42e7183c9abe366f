//! Sequential execution of delay steps.

use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{SequencerConfig, TimeoutConfig};
use crate::observability::metrics::{
    self, OUTCOME_CANCELLED, OUTCOME_COMPLETED, VARIANT_STREAMING, VARIANT_WITHOUT_CANCELLATION,
    VARIANT_WITH_CANCELLATION,
};
use crate::sequencer::outcome::{
    ResponseMessage, SequenceError, WITHOUT_CANCELLATION_COMPLETED, WITH_CANCELLATION_COMPLETED,
};
use crate::sequencer::steps::{positive_millis, DelaySpec, StepPlan, TaskStep};

/// Runs ordered delay steps on behalf of one request at a time.
///
/// Holds only immutable defaults and limits; every invocation owns its own
/// step iterator, so one instance is shared freely between requests.
#[derive(Debug, Clone)]
pub struct TaskSequencer {
    default_delays: DelaySpec,
    default_plan: StepPlan,
    max_total_steps: u32,
    max_step_duration_ms: u64,
    run_deadline: Duration,
}

impl TaskSequencer {
    /// Build from an already validated configuration. Requests whose full
    /// run would not finish before `run_deadline` are rejected up front.
    pub fn new(config: &SequencerConfig, run_deadline: Duration) -> Self {
        Self {
            default_delays: DelaySpec::from_millis(&config.default_delays_ms),
            default_plan: StepPlan::new(
                config.total_steps,
                Duration::from_millis(config.step_duration_ms),
            ),
            max_total_steps: config.max_total_steps,
            max_step_duration_ms: config.max_step_duration_ms,
            run_deadline,
        }
    }

    /// Validate raw delay input against the configured limits.
    pub fn delays(&self, delays_ms: &[i64]) -> Result<DelaySpec, SequenceError> {
        let delays = DelaySpec::parse(delays_ms, self.max_step_duration_ms)?;
        self.within_deadline("delays", delays.total_duration())?;
        Ok(delays)
    }

    /// Resolve optional step parameters, falling back to the configured plan.
    pub fn plan(
        &self,
        total_steps: Option<i64>,
        step_duration_ms: Option<i64>,
    ) -> Result<StepPlan, SequenceError> {
        let total_steps = match total_steps {
            None => self.default_plan.total_steps(),
            Some(n) if n < 0 => {
                return Err(SequenceError::InvalidArgument(format!(
                    "totalSteps must not be negative, got {n}"
                )))
            }
            Some(n) => match u32::try_from(n) {
                Ok(steps) if steps <= self.max_total_steps => steps,
                _ => {
                    return Err(SequenceError::InvalidArgument(format!(
                        "totalSteps must not exceed {}, got {n}",
                        self.max_total_steps
                    )))
                }
            },
        };

        let step_duration = match step_duration_ms {
            None => self.default_plan.step_duration(),
            Some(ms) => positive_millis("stepDurationMs", ms, self.max_step_duration_ms)?,
        };

        let plan = StepPlan::new(total_steps, step_duration);
        self.within_deadline("totalSteps * stepDurationMs", plan.total_duration())?;
        Ok(plan)
    }

    fn within_deadline(&self, name: &str, total: Duration) -> Result<(), SequenceError> {
        if total >= self.run_deadline {
            return Err(SequenceError::InvalidArgument(format!(
                "{name} adds up to {} ms, which does not fit the {} ms request timeout",
                total.as_millis(),
                self.run_deadline.as_millis()
            )));
        }
        Ok(())
    }

    /// Run every delay in order, ignoring cancellation entirely.
    ///
    /// Takes no cancellation handle: once started, the sequence always runs
    /// to the end, even if the caller has gone away. An empty `delays`
    /// selects the default sequence.
    pub async fn run_without_cancellation(
        &self,
        correlation_id: &str,
        delays: DelaySpec,
    ) -> ResponseMessage {
        let delays = if delays.is_empty() {
            self.default_delays.clone()
        } else {
            delays
        };

        info!("{correlation_id} - Started");
        for step in delays.steps() {
            tokio::time::sleep(step.duration()).await;
            info!("{correlation_id} - {} was done", step.task_name());
            metrics::record_step(VARIANT_WITHOUT_CANCELLATION);
        }

        metrics::record_run(VARIANT_WITHOUT_CANCELLATION, OUTCOME_COMPLETED);
        ResponseMessage::new(WITHOUT_CANCELLATION_COMPLETED)
    }

    /// Run `plan`, stopping as soon as `cancellation` fires.
    ///
    /// The handle is checked before each step and raced against every wait,
    /// so a long step is interrupted mid-wait. On cancellation nothing
    /// further is logged as progress and no message is produced.
    pub async fn run_with_cancellation(
        &self,
        correlation_id: &str,
        cancellation: &CancellationToken,
        plan: StepPlan,
    ) -> Result<ResponseMessage, SequenceError> {
        if cancellation.is_cancelled() {
            return Err(cancelled(correlation_id, 0, plan.total_steps()));
        }

        for step in plan.steps() {
            if wait_step(cancellation, &step).await.is_err() {
                return Err(cancelled(correlation_id, step.ordinal() - 1, step.total()));
            }
            info!("{correlation_id} - {}", step.progress());
            metrics::record_step(VARIANT_WITH_CANCELLATION);
        }

        metrics::record_run(VARIANT_WITH_CANCELLATION, OUTCOME_COMPLETED);
        Ok(ResponseMessage::new(WITH_CANCELLATION_COMPLETED))
    }

    /// Like [`run_with_cancellation`](Self::run_with_cancellation), but
    /// yields each step as it completes instead of a final message.
    ///
    /// Cancellation ends the stream quietly: by the time a consumer is
    /// reading it, the response has already started.
    pub fn progress_stream(
        correlation_id: String,
        cancellation: CancellationToken,
        plan: StepPlan,
    ) -> impl Stream<Item = TaskStep> + Send + 'static {
        stream::unfold(
            (plan.steps(), correlation_id, cancellation),
            |(mut steps, correlation_id, cancellation)| async move {
                let Some(step) = steps.next() else {
                    metrics::record_run(VARIANT_STREAMING, OUTCOME_COMPLETED);
                    return None;
                };
                if wait_step(&cancellation, &step).await.is_err() {
                    debug!(
                        completed = step.ordinal() - 1,
                        "{correlation_id} - Cancelled after response started; ending stream"
                    );
                    metrics::record_run(VARIANT_STREAMING, OUTCOME_CANCELLED);
                    return None;
                }
                info!("{correlation_id} - {}", step.progress());
                metrics::record_step(VARIANT_STREAMING);
                Some((step, (steps, correlation_id, cancellation)))
            },
        )
    }
}

impl Default for TaskSequencer {
    fn default() -> Self {
        Self::new(
            &SequencerConfig::default(),
            Duration::from_secs(TimeoutConfig::default().request_secs),
        )
    }
}

fn cancelled(correlation_id: &str, completed: u32, total: u32) -> SequenceError {
    info!(completed, total, "{correlation_id} - Cancellation requested");
    metrics::record_run(VARIANT_WITH_CANCELLATION, OUTCOME_CANCELLED);
    SequenceError::CancellationRequested
}

/// Sleep for one step unless the handle fires first. A handle that is
/// already cancelled wins without sleeping.
async fn wait_step(cancellation: &CancellationToken, step: &TaskStep) -> Result<(), SequenceError> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(SequenceError::CancellationRequested),
        _ = tokio::time::sleep(step.duration()) => Ok(()),
    }
}
