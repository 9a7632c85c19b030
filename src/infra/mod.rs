//! Infrastructure adapters backing the scheduler core.

pub mod queue;
