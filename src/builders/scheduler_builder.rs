//! Builder to construct a scheduler from configuration.

use std::sync::Arc;

use crate::config::ThrottleConfig;
use crate::core::{EventSink, Scheduler, SchedulerError, Spawn};

/// Builder for [`Scheduler`] instances.
pub struct SchedulerBuilder {
    config: ThrottleConfig,
    events: Option<Arc<dyn EventSink>>,
}

impl SchedulerBuilder {
    /// Start from a configuration.
    pub const fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Read configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for unparsable or invalid values.
    pub fn from_env() -> Result<Self, SchedulerError> {
        Ok(Self::new(ThrottleConfig::from_env()?))
    }

    /// Report lifecycle events to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] when the configuration is invalid.
    pub fn build<T, E, S>(self, spawner: S) -> Result<Scheduler<T, E, S>, SchedulerError>
    where
        T: Send + 'static,
        E: Send + 'static,
        S: Spawn,
    {
        self.config.validate()?;
        let gate = self.config.build_gate()?;
        tracing::debug!(config = ?self.config, "building scheduler");
        Ok(Scheduler::from_parts(gate, spawner, self.events))
    }
}
