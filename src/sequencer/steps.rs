//! Step definitions: the delay list, the fixed-size plan, and the steps
//! derived from them.

use std::fmt;
use std::time::Duration;

use crate::sequencer::outcome::SequenceError;

/// A single simulated sub-task. Created per invocation and dropped once its
/// completion has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStep {
    ordinal: u32,
    total: u32,
    duration: Duration,
}

impl TaskStep {
    pub fn new(ordinal: u32, total: u32, duration: Duration) -> Self {
        Self {
            ordinal,
            total,
            duration,
        }
    }

    /// 1-based position within the sequence.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Display name used by the cancellation-unaware variant: `Task 2`.
    pub fn task_name(&self) -> TaskName {
        TaskName(self.ordinal)
    }

    /// Display name used by the cancellation-aware variant: `2/3`.
    pub fn progress(&self) -> Progress {
        Progress {
            ordinal: self.ordinal,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TaskName(u32);

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Progress {
    ordinal: u32,
    total: u32,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ordinal, self.total)
    }
}

/// Ordered list of step durations. An empty list means "use the defaults";
/// the sequencer performs that substitution, not this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelaySpec(Vec<Duration>);

impl DelaySpec {
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self(delays_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// Validate raw request input. Every entry must be in `1..=max_ms`.
    pub fn parse(delays_ms: &[i64], max_ms: u64) -> Result<Self, SequenceError> {
        delays_ms
            .iter()
            .enumerate()
            .map(|(i, &ms)| positive_millis(&format!("delays[{i}]"), ms, max_ms))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Time a full run of these delays takes.
    pub fn total_duration(&self) -> Duration {
        self.0.iter().fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
    }

    pub fn steps(&self) -> impl Iterator<Item = TaskStep> + '_ {
        let total = self.0.len() as u32;
        self.0
            .iter()
            .zip(1..)
            .map(move |(&duration, ordinal)| TaskStep::new(ordinal, total, duration))
    }
}

/// `total_steps` equal steps of `step_duration` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    total_steps: u32,
    step_duration: Duration,
}

impl StepPlan {
    pub fn new(total_steps: u32, step_duration: Duration) -> Self {
        Self {
            total_steps,
            step_duration,
        }
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    pub fn total_duration(&self) -> Duration {
        self.step_duration.saturating_mul(self.total_steps)
    }

    pub fn steps(self) -> impl Iterator<Item = TaskStep> + Send + 'static {
        (1..=self.total_steps)
            .map(move |ordinal| TaskStep::new(ordinal, self.total_steps, self.step_duration))
    }
}

impl Default for StepPlan {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

pub(crate) fn positive_millis(name: &str, value: i64, max_ms: u64) -> Result<Duration, SequenceError> {
    let ms = match u64::try_from(value) {
        Ok(ms) if ms > 0 => ms,
        _ => {
            return Err(SequenceError::InvalidArgument(format!(
                "{name} must be greater than 0, got {value}"
            )))
        }
    };
    if ms > max_ms {
        return Err(SequenceError::InvalidArgument(format!(
            "{name} must not exceed {max_ms}, got {value}"
        )));
    }
    Ok(Duration::from_millis(ms))
}
