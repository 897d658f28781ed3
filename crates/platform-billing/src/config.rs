//! Scavenger configuration.
//!
//! Loaded from environment variables with defaults suited to production
//! sweeping of abandoned billing records.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Scavenger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScavengerConfig {
    /// Minimum age in seconds before a tagged record is deleted.
    pub grace_period_secs: u64,

    /// Seconds between sweeps.
    pub interval_secs: u64,

    /// Whether periodic sweeping runs at all.
    pub enabled: bool,
}

impl Default for ScavengerConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 3600,
            interval_secs: 600,
            enabled: true,
        }
    }
}

impl ScavengerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BILLING_SCAVENGER_GRACE_SECS`: Grace period (default: 3600)
    /// - `BILLING_SCAVENGER_INTERVAL_SECS`: Sweep interval (default: 600)
    /// - `BILLING_SCAVENGER_ENABLED`: Whether to sweep (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            grace_period_secs: std::env::var("BILLING_SCAVENGER_GRACE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.grace_period_secs),
            interval_secs: std::env::var("BILLING_SCAVENGER_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.interval_secs),
            enabled: std::env::var("BILLING_SCAVENGER_ENABLED")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.enabled),
        }
    }

    /// Grace period as a chrono duration, for comparing record timestamps.
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.grace_period_secs).unwrap_or(i64::MAX))
    }

    /// Sweep interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Reject a zero interval or grace period.
    ///
    /// A zero grace period would delete records of creations still running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.grace_period_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "grace_period_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScavengerConfig::default();
        assert_eq!(config.grace_period(), chrono::Duration::hours(1));
        assert_eq!(config.interval(), Duration::from_secs(600));
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ScavengerConfig {
            grace_period_secs: 0,
            ..ScavengerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "grace_period_secs"
        ));

        let config = ScavengerConfig {
            interval_secs: 0,
            ..ScavengerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
