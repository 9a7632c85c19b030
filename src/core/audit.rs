//! Lifecycle event sinks.
//!
//! The scheduler reports each entry's transitions (queued, dispatched,
//! fulfilled, rejected, abandoned) to an optional [`EventSink`]. This is also
//! the explicit notification for entries dropped by a queue clear.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::TaskId;

/// Lifecycle transition of a task entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Appended to the queue.
    Queued,
    /// Admitted and handed to the runtime.
    Dispatched,
    /// Completed successfully.
    Fulfilled,
    /// Completed with a failure or panic.
    Rejected,
    /// Discarded from the queue without running.
    Abandoned,
}

/// A single lifecycle event.
#[derive(Debug, Clone)]
pub struct ThrottleEvent {
    /// Entry the event refers to.
    pub task_id: TaskId,
    /// Transition taken.
    pub kind: EventKind,
    /// When the scheduler observed the transition.
    pub at: Instant,
    /// Pending entries after the transition.
    pub queued: usize,
    /// In-flight entries after the transition.
    pub in_flight: usize,
}

/// Event sink abstraction.
pub trait EventSink: Send + Sync {
    /// Record an event.
    ///
    /// Called while the scheduler holds its state lock, so implementations
    /// must not call back into the scheduler.
    fn record(&self, event: ThrottleEvent);
}

/// Bounded in-memory sink for testing and dev.
///
/// Clones share the same buffer, so a test can keep one clone and hand the
/// other to the scheduler.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<ThrottleEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink holding at most `max_events`.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<ThrottleEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events of one kind, oldest first.
    pub fn events_of(&self, kind: EventKind) -> Vec<ThrottleEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: ThrottleEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}
