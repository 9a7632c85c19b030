//! Throttle configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::{AdmissionGate, ConcurrencyGate, RateGate, SchedulerError};

/// Environment variable selecting the rate policy.
pub const ENV_REQUESTS_PER_SECOND: &str = "THROTTLE_REQUESTS_PER_SECOND";
/// Environment variable selecting the concurrency policy.
pub const ENV_CONCURRENCY: &str = "THROTTLE_CONCURRENCY";

const fn default_concurrency() -> u32 {
    1
}

/// Admission policy of a scheduler.
///
/// JSON form is tagged by `policy`:
///
/// ```json
/// { "policy": "concurrency", "concurrency": 4 }
/// { "policy": "rate", "requests_per_second": 2.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ThrottleConfig {
    /// Cap on simultaneously executing tasks.
    Concurrency {
        /// Maximum tasks in flight. Defaults to 1.
        #[serde(default = "default_concurrency")]
        concurrency: u32,
    },
    /// Cap on task starts per second.
    Rate {
        /// Starts per second; also bounds tasks in flight.
        requests_per_second: f64,
    },
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::Concurrency {
            concurrency: default_concurrency(),
        }
    }
}

impl ThrottleConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for a zero concurrency or a
    /// rate that is not a positive finite number.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        match *self {
            Self::Concurrency { concurrency } if concurrency == 0 => Err(
                SchedulerError::InvalidConfig("concurrency must be greater than 0".into()),
            ),
            Self::Rate {
                requests_per_second,
            } if !requests_per_second.is_finite() || requests_per_second <= 0.0 => {
                Err(SchedulerError::InvalidConfig(format!(
                    "requests_per_second must be a positive number, got {requests_per_second}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, SchedulerError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| SchedulerError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the process environment, loading `.env` first.
    ///
    /// `THROTTLE_REQUESTS_PER_SECOND` selects the rate policy and wins over
    /// `THROTTLE_CONCURRENCY`. With neither set the default (concurrency 1)
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] when a variable does not
    /// parse or fails validation.
    pub fn from_env() -> Result<Self, SchedulerError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ThrottleConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cfg = if let Some(raw) = lookup(ENV_REQUESTS_PER_SECOND) {
            let requests_per_second = raw.trim().parse::<f64>().map_err(|e| {
                SchedulerError::InvalidConfig(format!("{ENV_REQUESTS_PER_SECOND}: {e}"))
            })?;
            Self::Rate {
                requests_per_second,
            }
        } else if let Some(raw) = lookup(ENV_CONCURRENCY) {
            let concurrency = raw.trim().parse::<u32>().map_err(|e| {
                SchedulerError::InvalidConfig(format!("{ENV_CONCURRENCY}: {e}"))
            })?;
            Self::Concurrency { concurrency }
        } else {
            Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Construct the admission gate this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] when validation fails.
    pub fn build_gate(&self) -> Result<Box<dyn AdmissionGate>, SchedulerError> {
        match *self {
            Self::Concurrency { concurrency } => {
                let limit = usize::try_from(concurrency)
                    .map_err(|e| SchedulerError::InvalidConfig(format!("concurrency: {e}")))?;
                Ok(Box::new(ConcurrencyGate::new(limit)?))
            }
            Self::Rate {
                requests_per_second,
            } => Ok(Box::new(RateGate::new(requests_per_second)?)),
        }
    }
}
