//! Caller-visible handles for submitted tasks.
//!
//! Every submission is paired with a settlement sink implementing [`Settle`].
//! The default sink, [`Promise`], is backed by a tokio oneshot channel and is
//! read through a [`TaskHandle`] future. Callers can plug their own sink via
//! `Scheduler::submit_with`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::core::TaskError;

/// Receives the final outcome of a task, exactly once.
///
/// Both methods consume the sink, so a second settlement cannot be expressed.
/// A sink dropped without either call marks an abandoned task.
pub trait Settle<T, E>: Send + 'static {
    /// Fulfil with the task's value.
    fn fulfil(self: Box<Self>, value: T);
    /// Reject with the task's failure.
    fn reject(self: Box<Self>, error: TaskError<E>);
}

/// Default settlement sink paired with a [`TaskHandle`].
#[derive(Debug)]
pub struct Promise<T, E> {
    tx: oneshot::Sender<Result<T, TaskError<E>>>,
}

impl<T, E> Promise<T, E> {
    /// Create a connected promise/handle pair.
    pub fn pair() -> (Self, TaskHandle<T, E>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, TaskHandle { rx })
    }
}

impl<T, E> Settle<T, E> for Promise<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn fulfil(self: Box<Self>, value: T) {
        // The caller may have dropped its handle; nobody is left to tell.
        let _ = self.tx.send(Ok(value));
    }

    fn reject(self: Box<Self>, error: TaskError<E>) {
        let _ = self.tx.send(Err(error));
    }
}

/// Future resolving to a submitted task's outcome.
///
/// Resolves to [`TaskError::Abandoned`] when the task was discarded from the
/// queue before it started.
#[derive(Debug)]
#[must_use = "dropping a TaskHandle discards the task's outcome, not the task"]
pub struct TaskHandle<T, E> {
    rx: oneshot::Receiver<Result<T, TaskError<E>>>,
}

impl<T, E> TaskHandle<T, E> {
    /// Non-blocking check for an outcome.
    ///
    /// Returns `None` while the task is queued or running.
    pub fn try_outcome(&mut self) -> Option<Result<T, TaskError<E>>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(TaskError::Abandoned)),
        }
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, TaskError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Abandoned)))
    }
}
