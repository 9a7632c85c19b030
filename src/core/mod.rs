//! Core scheduling abstractions and admission accounting.

pub mod audit;
pub mod error;
pub mod gate;
pub mod handle;
pub mod scheduler;

pub use audit::{EventKind, EventSink, InMemoryEventSink, ThrottleEvent};
pub use error::{SchedulerError, TaskError};
pub use gate::{AdmissionGate, ConcurrencyGate, Decision, FailurePolicy, RateGate, CEILING_BACKOFF};
pub use handle::{Promise, Settle, TaskHandle};
pub use scheduler::{Scheduler, SchedulerStats, Spawn, TaskId};
