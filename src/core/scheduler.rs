//! FIFO task scheduler driven by an [`AdmissionGate`].
//!
//! The queue and gate state sit behind a single `parking_lot::Mutex`, so each
//! admission check, counter update, queue pop and hand-off to the spawner is
//! one critical section. Events are recorded inside it so their order matches
//! the order of the state changes. Task closures and settlement sinks always
//! run outside it.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::core::{
    AdmissionGate, ConcurrencyGate, Decision, EventKind, EventSink, FailurePolicy, Promise,
    RateGate, SchedulerError, Settle, TaskError, TaskHandle, ThrottleEvent,
};
use crate::infra::queue::InMemoryQueue;

/// Identifier assigned to each submission, increasing in submission order.
pub type TaskId = u64;

type TaskFn<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

/// Abstraction for spawning task execution on a runtime.
///
/// Implementations must not poll the future inline: the scheduler may call
/// these methods while holding its state lock.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn a future to run in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future that starts once `delay` has elapsed.
    fn spawn_after<F>(&self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SchedulerStats {
    /// Entries waiting for admission.
    pub queued: usize,
    /// Entries dispatched and not yet completed.
    pub in_flight: usize,
    /// Total submissions.
    pub submitted: u64,
    /// Total successful completions.
    pub completed: u64,
    /// Total failed or panicked completions.
    pub failed: u64,
    /// Total entries discarded before dispatch.
    pub abandoned: u64,
}

/// A pending unit of work plus the sink that receives its outcome.
struct TaskEntry<T, E> {
    id: TaskId,
    task: TaskFn<T, E>,
    settle: Box<dyn Settle<T, E>>,
}

#[derive(Default)]
struct Counters {
    submitted: u64,
    completed: u64,
    failed: u64,
    abandoned: u64,
}

struct State<T, E> {
    queue: InMemoryQueue<TaskEntry<T, E>>,
    gate: Box<dyn AdmissionGate>,
    in_flight: usize,
    /// Bumped by a fail-fast reset; older dispatches no longer count as in flight.
    epoch: u64,
    next_id: TaskId,
    /// Deadline of the pending deferred re-check, if any.
    retry_at: Option<Instant>,
    counters: Counters,
}

struct Inner<T, E, S> {
    state: Mutex<State<T, E>>,
    policy: FailurePolicy,
    spawner: S,
    events: Option<Arc<dyn EventSink>>,
}

/// Task scheduler admitting queued work in strict submission order.
///
/// Cloning is cheap; clones share the same queue and gate.
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_throttle::core::Scheduler;
/// use prometheus_throttle::runtime::TokioSpawner;
///
/// let spawner = TokioSpawner::new(tokio::runtime::Handle::current());
/// let throttle = Scheduler::<String, std::io::Error, _>::with_rate(2.0, spawner)?;
///
/// let handle = throttle.submit(|| async { Ok("done".to_string()) });
/// assert_eq!(handle.await?, "done");
/// ```
pub struct Scheduler<T, E, S> {
    inner: Arc<Inner<T, E, S>>,
}

impl<T, E, S> Clone for Scheduler<T, E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E, S> Scheduler<T, E, S>
where
    T: Send + 'static,
    E: Send + 'static,
    S: Spawn,
{
    /// Create a scheduler from a gate and a spawner.
    pub fn new<G: AdmissionGate>(gate: G, spawner: S) -> Self {
        Self::from_parts(Box::new(gate), spawner, None)
    }

    /// Create a scheduler running at most `limit` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] when `limit` is zero.
    pub fn with_concurrency(limit: usize, spawner: S) -> Result<Self, SchedulerError> {
        Ok(Self::new(ConcurrencyGate::new(limit)?, spawner))
    }

    /// Create a scheduler starting at most `requests_per_second` tasks per second.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] unless the rate is a positive
    /// finite number.
    pub fn with_rate(requests_per_second: f64, spawner: S) -> Result<Self, SchedulerError> {
        Ok(Self::new(RateGate::new(requests_per_second)?, spawner))
    }

    /// Create a scheduler from a boxed gate and an optional event sink.
    pub fn from_parts(
        gate: Box<dyn AdmissionGate>,
        spawner: S,
        events: Option<Arc<dyn EventSink>>,
    ) -> Self {
        let policy = gate.failure_policy();
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    queue: InMemoryQueue::new(),
                    gate,
                    in_flight: 0,
                    epoch: 0,
                    next_id: 1,
                    retry_at: None,
                    counters: Counters::default(),
                }),
                policy,
                spawner,
                events,
            }),
        }
    }

    /// Failure handling applied by this scheduler's gate.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.inner.policy
    }

    /// Submit a task and get a handle to its outcome.
    ///
    /// The task is queued and admission is attempted before this returns, so
    /// it may already be running. Never blocks.
    pub fn submit<F, Fut>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (promise, handle) = Promise::pair();
        self.submit_with(task, promise);
        handle
    }

    /// Submit a task whose outcome goes to a caller-supplied sink.
    ///
    /// The sink is fulfilled or rejected exactly once, or dropped unsettled if
    /// the entry is abandoned.
    pub fn submit_with<F, Fut, P>(&self, task: F, settle: P) -> TaskId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        P: Settle<T, E>,
    {
        let task: TaskFn<T, E> = Box::new(move || task().boxed());
        let id = {
            let mut state = self.inner.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.queue.enqueue(TaskEntry {
                id,
                task,
                settle: Box::new(settle),
            });
            state.counters.submitted += 1;
            debug!(task_id = id, queued = state.queue.len(), "task queued");
            self.record(id, EventKind::Queued, Instant::now(), &state);
            id
        };
        self.pump();
        id
    }

    /// Submit every task in order.
    ///
    /// Handles come back in the same order; dropping them does not cancel the
    /// tasks.
    pub fn submit_all<I, F, Fut>(&self, tasks: I) -> Vec<TaskHandle<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        tasks.into_iter().map(|task| self.submit(task)).collect()
    }

    /// Discard every queued task that has not started yet.
    ///
    /// Discarded tasks are never run and their handles resolve to
    /// [`TaskError::Abandoned`]. Running tasks are unaffected. Returns the
    /// number of discarded entries; clearing an empty queue returns 0.
    pub fn clear_queue(&self) -> usize {
        let dropped = {
            let mut state = self.inner.state.lock();
            self.abandon_pending(&mut state)
        };
        let count = dropped.len();
        if count > 0 {
            warn!(abandoned = count, "pending tasks cleared");
        }
        drop(dropped);
        count
    }

    /// Snapshot of queue and completion counters.
    pub fn stats(&self) -> SchedulerStats {
        let state = self.inner.state.lock();
        SchedulerStats {
            queued: state.queue.len(),
            in_flight: state.in_flight,
            submitted: state.counters.submitted,
            completed: state.counters.completed,
            failed: state.counters.failed,
            abandoned: state.counters.abandoned,
        }
    }

    /// Admit and dispatch queue heads until the gate says stop.
    ///
    /// Heads are handed to the spawner before the lock is released, so two
    /// concurrent callers can never start entries out of submission order.
    fn pump(&self) {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        while !state.queue.is_empty() {
            let now = Instant::now();
            match state.gate.try_admit(now, state.queue.len(), state.in_flight) {
                Decision::Admit => {
                    let entry = match state.queue.dequeue_head() {
                        Ok(entry) => entry,
                        Err(e) => {
                            error!("admitted with nothing to dequeue: {}", e);
                            return;
                        }
                    };
                    state.in_flight += 1;
                    debug!(
                        task_id = entry.id,
                        in_flight = state.in_flight,
                        queued = state.queue.len(),
                        "task dispatched"
                    );
                    self.record(entry.id, EventKind::Dispatched, now, state);
                    self.dispatch(entry, state.epoch);
                }
                Decision::Defer => return,
                Decision::RetryAfter(delay) => {
                    self.schedule_recheck(state, now + delay, delay);
                    return;
                }
            }
        }
    }

    /// Arrange one deferred `pump`, unless an earlier one is already pending.
    fn schedule_recheck(&self, state: &mut State<T, E>, deadline: Instant, delay: Duration) {
        if state.retry_at.is_some_and(|pending| pending <= deadline) {
            return;
        }
        state.retry_at = Some(deadline);
        debug!(?delay, "admission re-check scheduled");

        let scheduler = self.clone();
        self.inner.spawner.spawn_after(delay, async move {
            {
                let mut state = scheduler.inner.state.lock();
                if state.retry_at == Some(deadline) {
                    state.retry_at = None;
                }
            }
            scheduler.pump();
        });
    }

    fn dispatch(&self, entry: TaskEntry<T, E>, epoch: u64) {
        let TaskEntry { id, task, settle } = entry;
        let scheduler = self.clone();
        self.inner.spawner.spawn(async move {
            let outcome = match AssertUnwindSafe(async move { task().await })
                .catch_unwind()
                .await
            {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(TaskError::Failed(err)),
                Err(panic) => Err(TaskError::Panicked(panic_message(panic.as_ref()))),
            };
            scheduler.on_task_finished(id, epoch, outcome, settle);
        });
    }

    /// Completion bookkeeping, settlement, then admission of the next entry.
    ///
    /// A panicking settlement sink is logged and swallowed so the next entry
    /// is still admitted.
    fn on_task_finished(
        &self,
        id: TaskId,
        epoch: u64,
        outcome: Result<T, TaskError<E>>,
        settle: Box<dyn Settle<T, E>>,
    ) {
        let failed = outcome.is_err();
        let dropped = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            if state.epoch == epoch {
                state.in_flight = state.in_flight.checked_sub(1).unwrap_or_else(|| {
                    error!(task_id = id, "in-flight counter underflow");
                    0
                });
            }

            let kind = if failed {
                state.counters.failed += 1;
                EventKind::Rejected
            } else {
                state.counters.completed += 1;
                EventKind::Fulfilled
            };
            self.record(id, kind, Instant::now(), state);

            match (failed, self.inner.policy) {
                (true, FailurePolicy::FailFast) => {
                    state.in_flight = 0;
                    state.epoch += 1;
                    self.abandon_pending(state)
                }
                _ => Vec::new(),
            }
        };

        if failed {
            debug!(task_id = id, "task failed");
        } else {
            debug!(task_id = id, "task completed");
        }
        if !dropped.is_empty() {
            warn!(
                task_id = id,
                abandoned = dropped.len(),
                "task failed under fail-fast policy; pending tasks abandoned"
            );
        }

        drop(dropped);

        let settled = panic::catch_unwind(AssertUnwindSafe(move || match outcome {
            Ok(value) => settle.fulfil(value),
            Err(err) => settle.reject(err),
        }));
        if let Err(payload) = settled {
            error!(
                task_id = id,
                panic = %panic_message(payload.as_ref()),
                "settlement sink panicked"
            );
        }

        self.pump();
    }

    /// Empty the queue, recording an abandonment event per entry.
    ///
    /// The entries are returned so the caller can drop them after unlocking.
    fn abandon_pending(&self, state: &mut State<T, E>) -> Vec<TaskEntry<T, E>> {
        let dropped = state.queue.clear();
        state.counters.abandoned += dropped.len() as u64;
        let now = Instant::now();
        for entry in &dropped {
            self.record(entry.id, EventKind::Abandoned, now, state);
        }
        dropped
    }

    fn record(&self, task_id: TaskId, kind: EventKind, at: Instant, state: &State<T, E>) {
        if let Some(sink) = self.inner.events.as_ref() {
            sink.record(ThrottleEvent {
                task_id,
                kind,
                at,
                queued: state.queue.len(),
                in_flight: state.in_flight,
            });
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}
