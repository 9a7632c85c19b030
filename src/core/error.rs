//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Head removal was attempted on an empty queue.
    #[error("queue is empty")]
    EmptyQueue,
}

/// Failure outcome delivered through a task handle.
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// The task ran and returned an error.
    #[error("task failed: {0}")]
    Failed(E),
    /// The task panicked while running.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The task was dropped from the queue before it started.
    #[error("task abandoned before dispatch")]
    Abandoned,
}

impl<E> TaskError<E> {
    /// Returns the task's own error, if this is a [`TaskError::Failed`].
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Panicked(_) | Self::Abandoned => None,
        }
    }

    /// True when the task never started because its queue entry was discarded.
    pub const fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }
}
