//! DurationResolver - Produces the delay before an auction closes
//!
//! Reads one configuration value (default key: `AUCTION_INTERVAL`) holding a
//! duration expression such as `5m`, `20s` or `1h 30m`. The outcome is kept
//! three-way so callers can pick per-outcome behavior:
//! - `Explicit`: a valid configured value
//! - `Defaulted`: nothing configured, the default applies
//! - `Invalid`: a value is configured but cannot be parsed

use crate::application::constants::{AUCTION_INTERVAL_KEY, DEFAULT_AUCTION_INTERVAL};
use crate::port::ConfigSource;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of resolving the closing interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDuration {
    Explicit(Duration),
    Defaulted { duration: Duration, reason: String },
    Invalid { raw: String, reason: String },
}

impl ResolvedDuration {
    /// The resolved duration; zero for `Invalid`
    pub fn duration(&self) -> Duration {
        match self {
            ResolvedDuration::Explicit(d) => *d,
            ResolvedDuration::Defaulted { duration, .. } => *duration,
            ResolvedDuration::Invalid { .. } => Duration::ZERO,
        }
    }

    /// Diagnostic message, if the configured value was not used as-is
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ResolvedDuration::Explicit(_) => None,
            ResolvedDuration::Defaulted { reason, .. } => Some(reason),
            ResolvedDuration::Invalid { reason, .. } => Some(reason),
        }
    }
}

/// Reads the closing interval from configuration on every call
pub struct DurationResolver {
    config: Arc<dyn ConfigSource>,
    key: String,
    default: Duration,
}

impl DurationResolver {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self {
            config,
            key: AUCTION_INTERVAL_KEY.to_string(),
            default: DEFAULT_AUCTION_INTERVAL,
        }
    }

    /// Fallback used for `Defaulted` (and by callers that recover from `Invalid`)
    pub fn default_duration(&self) -> Duration {
        self.default
    }

    /// Resolve the interval from the current configuration
    ///
    /// Not cached: a configuration change applies to the next call.
    pub fn resolve(&self) -> ResolvedDuration {
        let raw = match self.config.get(&self.key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                return ResolvedDuration::Defaulted {
                    duration: self.default,
                    reason: format!(
                        "{} is not set, using default {}",
                        self.key,
                        humantime::format_duration(self.default)
                    ),
                }
            }
        };

        match humantime::parse_duration(raw.trim()) {
            Ok(duration) => ResolvedDuration::Explicit(duration),
            Err(e) => ResolvedDuration::Invalid {
                reason: format!(
                    "{} is not a valid duration ({}), example: 20s or 2m",
                    self.key, e
                ),
                raw,
            },
        }
    }
}
