//! Limiter configuration and validation.

use std::time::Duration;

/// Immutable per-service rate configuration.
///
/// Defines the refill rate as `max_requests` tokens per `window`. The bucket
/// capacity equals `max_requests`, so a full window's worth of calls can
/// burst through before pacing kicks in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimiterConfig {
    name: String,
    max_requests: u32,
    window: Duration,
}

/// Errors produced when validating a limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `max_requests` must be > 0.
    #[error("max_requests must be > 0 (got {provided})")]
    InvalidMaxRequests {
        /// Value provided by caller.
        provided: u32,
    },
    /// The window must span at least one whole millisecond.
    #[error("window must be at least 1ms (got {provided:?})")]
    InvalidWindow {
        /// Value provided by caller.
        provided: Duration,
    },
}

impl LimiterConfig {
    /// Create a config with validation.
    ///
    /// Fails fast if `max_requests` is zero or `window` rounds down to zero
    /// milliseconds; no limiter is created from an invalid config.
    pub fn new(
        name: impl Into<String>,
        max_requests: u32,
        window: Duration,
    ) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::InvalidMaxRequests { provided: max_requests });
        }
        if window.as_millis() == 0 {
            return Err(ConfigError::InvalidWindow { provided: window });
        }
        Ok(Self { name: name.into(), max_requests, window })
    }

    /// Service name this config applies to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tokens granted per window; also the bucket capacity.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Refill window.
    pub fn window(&self) -> Duration {
        self.window
    }
}
