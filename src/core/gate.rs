//! Admission gates deciding when the head of the queue may start.
//!
//! Two gates share one capability, [`AdmissionGate`]:
//!
//! - [`ConcurrencyGate`] caps the number of simultaneously executing tasks and
//!   is purely event-driven. A failed task affects nobody else
//!   ([`FailurePolicy::Isolate`]).
//! - [`RateGate`] spaces task starts at least `1s / requests_per_second` apart
//!   and also uses the rate as a ceiling on in-flight work. A failed task
//!   abandons the rest of the backlog ([`FailurePolicy::FailFast`]).

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::SchedulerError;

/// Back-off used when the rate gate's in-flight ceiling is reached.
pub const CEILING_BACKOFF: Duration = Duration::from_secs(1);

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start the head entry now.
    Admit,
    /// Nothing to do until the next submission or completion.
    Defer,
    /// Check again once the given delay has elapsed.
    RetryAfter(Duration),
}

/// What a task failure does to the rest of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The failure is reported to its own handle only; siblings proceed.
    Isolate,
    /// The failure clears every pending entry and resets in-flight accounting.
    FailFast,
}

/// Decides whether the head of the queue may be admitted right now.
///
/// Implementations may update their own timing state when they return
/// [`Decision::Admit`]; the scheduler then commits the admission in the same
/// critical section.
pub trait AdmissionGate: Send + fmt::Debug + 'static {
    /// Check admission for the current queue length and in-flight count.
    fn try_admit(&mut self, now: Instant, queued: usize, in_flight: usize) -> Decision;

    /// Failure handling this gate requires from the scheduler.
    fn failure_policy(&self) -> FailurePolicy;
}

/// Counter-based gate: at most `limit` tasks in flight.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    limit: usize,
}

impl ConcurrencyGate {
    /// Create a gate admitting up to `limit` simultaneous tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] when `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, SchedulerError> {
        if limit == 0 {
            return Err(SchedulerError::InvalidConfig(
                "concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self { limit })
    }

    /// Configured concurrency limit.
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self { limit: 1 }
    }
}

impl AdmissionGate for ConcurrencyGate {
    fn try_admit(&mut self, _now: Instant, queued: usize, in_flight: usize) -> Decision {
        if queued > 0 && in_flight < self.limit {
            Decision::Admit
        } else {
            Decision::Defer
        }
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Isolate
    }
}

/// Time-based gate: evenly spaced starts, `requests_per_second` at most.
#[derive(Debug, Clone)]
pub struct RateGate {
    requests_per_second: f64,
    min_interval: Duration,
    /// `None` until the first admission, so the first task never waits.
    last_start: Option<Instant>,
}

impl RateGate {
    /// Create a gate admitting at most `requests_per_second` starts per second.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] unless the rate is a positive
    /// finite number.
    pub fn new(requests_per_second: f64) -> Result<Self, SchedulerError> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "requests_per_second must be a positive number, got {requests_per_second}"
            )));
        }
        let min_interval = Duration::try_from_secs_f64(1.0 / requests_per_second)
            .map_err(|e| SchedulerError::InvalidConfig(format!("requests_per_second: {e}")))?;
        Ok(Self {
            requests_per_second,
            min_interval,
            last_start: None,
        })
    }

    /// Configured rate.
    pub const fn requests_per_second(&self) -> f64 {
        self.requests_per_second
    }

    /// Minimum spacing between two admissions.
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time of the most recent admission.
    pub const fn last_start(&self) -> Option<Instant> {
        self.last_start
    }

    #[allow(clippy::cast_precision_loss)]
    fn ceiling_reached(&self, in_flight: usize) -> bool {
        in_flight as f64 >= self.requests_per_second
    }
}

impl AdmissionGate for RateGate {
    fn try_admit(&mut self, now: Instant, queued: usize, in_flight: usize) -> Decision {
        if queued == 0 {
            return Decision::Defer;
        }
        if self.ceiling_reached(in_flight) {
            return Decision::RetryAfter(CEILING_BACKOFF);
        }

        let elapsed = self
            .last_start
            .map_or(Duration::MAX, |last| now.saturating_duration_since(last));
        if elapsed >= self.min_interval {
            self.last_start = Some(now);
            Decision::Admit
        } else {
            Decision::RetryAfter(self.min_interval - elapsed)
        }
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FailFast
    }
}
