//! Configuration models for admission policies.

pub mod throttle;

pub use throttle::{ThrottleConfig, ENV_CONCURRENCY, ENV_REQUESTS_PER_SECOND};
