//! Store configuration.
//!
//! Loaded from environment variables with defaults suited to local
//! development and tests.

use serde::{Deserialize, Serialize};
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

/// Tunables shared by every store built on a blob container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Buffered events per watch before the producer blocks.
    pub watch_buffer_size: usize,

    /// Upper bound applied to list page sizes.
    pub max_page_size: usize,

    /// Events an in-memory container retains per lagging watcher.
    pub change_feed_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            watch_buffer_size: platform_events::DEFAULT_WATCH_BUFFER,
            max_page_size: 500,
            change_feed_capacity: 1024,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STORE_WATCH_BUFFER_SIZE`: Per-watch buffer (default: 100)
    /// - `STORE_MAX_PAGE_SIZE`: List page size ceiling (default: 500)
    /// - `STORE_CHANGE_FEED_CAPACITY`: Change feed capacity (default: 1024)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            watch_buffer_size: env_or("STORE_WATCH_BUFFER_SIZE", default.watch_buffer_size),
            max_page_size: env_or("STORE_MAX_PAGE_SIZE", default.max_page_size),
            change_feed_capacity: env_or("STORE_CHANGE_FEED_CAPACITY", default.change_feed_capacity),
        }
    }

    /// Reject zero-sized buffers and pages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("watch_buffer_size", self.watch_buffer_size),
            ("max_page_size", self.max_page_size),
            ("change_feed_capacity", self.change_feed_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Clamp a requested page size. `None` and zero mean "as many as allowed".
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.max_page_size),
            _ => self.max_page_size,
        }
    }
}

fn env_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
