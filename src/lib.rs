//! # Prometheus Throttle
//!
//! An in-process task admission scheduler for the Prometheus AI Platform.
//!
//! Callers submit deferred units of work (closures returning a future of
//! `Result<T, E>`) and the scheduler decides when each one may start. Queued
//! work is admitted in strict submission order under one of two policies:
//!
//! - **Concurrency cap** ([`core::ConcurrencyGate`]): at most N tasks execute
//!   at once. A failed task is reported to its own handle only.
//! - **Rate cap** ([`core::RateGate`]): at most N task starts per second,
//!   evenly spaced, with N also bounding tasks in flight. A failed task
//!   abandons every entry still waiting in the queue.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_throttle::builders::SchedulerBuilder;
//! use prometheus_throttle::config::ThrottleConfig;
//! use prometheus_throttle::runtime::TokioSpawner;
//!
//! let throttle = SchedulerBuilder::new(ThrottleConfig::Concurrency { concurrency: 2 })
//!     .build::<String, std::io::Error, _>(TokioSpawner::current())?;
//!
//! let handles = throttle.submit_all((0..10).map(|i| move || async move {
//!     Ok(format!("job {i}"))
//! }));
//! for handle in handles {
//!     println!("{}", handle.await?);
//! }
//! ```
//!
//! Abandoned tasks (dropped by [`core::Scheduler::clear_queue`] or by the
//! rate policy's failure handling) never run; their handles resolve to
//! [`core::TaskError::Abandoned`].

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and admission accounting.
pub mod core;
/// Configuration models for admission policies.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure adapters backing the scheduler core.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
