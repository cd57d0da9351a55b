//! Client configuration.

use std::time::Duration;

use basalt_core::limits::{
    CALL_TIMEOUT_MS_DEFAULT, META_LOOKUP_TIMEOUT_MS_DEFAULT, SCAN_BATCH_ROWS_DEFAULT,
    SCAN_BATCH_ROWS_MAX,
};
use basalt_routing::ResolverConfig;
use thiserror::Error;

/// Configuration for a Basalt client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coordination service quorum (comma-separated `host[:port]` list).
    pub quorum: String,
    /// Deadline applied to each call made by the per-verb helpers and scans.
    pub call_timeout: Duration,
    /// Deadline for one `hbase:meta` lookup.
    pub meta_lookup_timeout: Duration,
    /// Rows requested per scanner fetch.
    pub scan_batch_rows: u32,
}

impl ClientConfig {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(quorum: impl Into<String>) -> Self {
        Self {
            quorum: quorum.into(),
            call_timeout: Duration::from_millis(CALL_TIMEOUT_MS_DEFAULT),
            meta_lookup_timeout: Duration::from_millis(META_LOOKUP_TIMEOUT_MS_DEFAULT),
            scan_batch_rows: SCAN_BATCH_ROWS_DEFAULT,
        }
    }

    /// Creates a configuration suitable for testing (short timeouts, small batches).
    #[must_use]
    pub fn fast_for_testing() -> Self {
        Self {
            quorum: String::from("localhost"),
            call_timeout: Duration::from_secs(1),
            meta_lookup_timeout: Duration::from_millis(500),
            scan_batch_rows: 2,
        }
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the meta lookup deadline.
    #[must_use]
    pub fn with_meta_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.meta_lookup_timeout = timeout;
        self
    }

    /// Sets the scanner batch size.
    #[must_use]
    pub fn with_scan_batch_rows(mut self, rows: u32) -> Self {
        self.scan_batch_rows = rows;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum.trim().is_empty() {
            return Err(ConfigError::EmptyQuorum);
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "call_timeout",
            });
        }
        if self.meta_lookup_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "meta_lookup_timeout",
            });
        }
        if self.scan_batch_rows == 0 || self.scan_batch_rows > SCAN_BATCH_ROWS_MAX {
            return Err(ConfigError::InvalidBatchRows {
                rows: self.scan_batch_rows,
            });
        }
        Ok(())
    }

    /// Returns the part of the configuration the resolver needs.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            quorum: self.quorum.clone(),
            meta_lookup_timeout: self.meta_lookup_timeout,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No coordination service quorum was given.
    #[error("quorum must not be empty")]
    EmptyQuorum,
    /// A deadline was zero.
    #[error("{name} must be greater than zero")]
    InvalidTimeout {
        /// The offending setting.
        name: &'static str,
    },
    /// The scanner batch size is out of range.
    #[error("scan_batch_rows must be in 1..={max}, got {rows}", max = SCAN_BATCH_ROWS_MAX)]
    InvalidBatchRows {
        /// The configured batch size.
        rows: u32,
    },
}
