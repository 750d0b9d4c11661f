//! # Controller Configuration
//!
//! Controller-level settings loaded from command-line flags, falling back to
//! environment variables (populated from a ConfigMap using `envFrom` in the
//! deployment) and finally to the defaults in [`crate::constants`].

use crate::config::{parse_duration, ConfigError};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_KEEP, DEFAULT_MAX_AGE,
    DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_METRICS_PORT, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WATCH_BACKOFF_MAX_MS, DEFAULT_WATCH_BACKOFF_START_MS,
    DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use crate::controller::reconciler::RetentionPolicy;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Controller-level configuration
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pod-gc-controller",
    version,
    about = "Garbage collects evicted pods per owning workload"
)]
pub struct ControllerConfig {
    /// Number of evicted pods to retain per owner reference
    #[arg(long, env = "GC_KEEP", default_value_t = DEFAULT_KEEP)]
    pub keep: usize,

    /// Maximum age of an evicted pod before it is deleted regardless of siblings
    /// (e.g. "30m", "1h30m", "7d"; "0" disables age-based collection)
    #[arg(long, env = "GC_MAX_AGE", default_value = DEFAULT_MAX_AGE, value_parser = parse_duration)]
    pub max_age: Duration,

    /// Maximum number of pods reconciled concurrently
    #[arg(long, env = "MAX_CONCURRENT_RECONCILES", default_value_t = DEFAULT_MAX_CONCURRENT_RECONCILES)]
    pub max_concurrent_reconciles: u16,

    /// Restrict the watch to a single namespace (all namespaces when unset)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Timeout applied to every get, list and delete request
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = parse_duration)]
    pub request_timeout: Duration,

    /// Port of the metrics and health probe server
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Fibonacci backoff lower bound after a failed reconciliation (seconds)
    #[arg(long, env = "BACKOFF_MIN_SECS", default_value_t = DEFAULT_BACKOFF_MIN_SECS)]
    pub backoff_min_secs: u64,

    /// Fibonacci backoff upper bound after a failed reconciliation (seconds)
    #[arg(long, env = "BACKOFF_MAX_SECS", default_value_t = DEFAULT_BACKOFF_MAX_SECS)]
    pub backoff_max_secs: u64,

    /// Watch stream backoff starting value (milliseconds)
    #[arg(long, env = "WATCH_BACKOFF_START_MS", default_value_t = DEFAULT_WATCH_BACKOFF_START_MS)]
    pub watch_backoff_start_ms: u64,

    /// Watch stream backoff maximum value (milliseconds)
    #[arg(long, env = "WATCH_BACKOFF_MAX_MS", default_value_t = DEFAULT_WATCH_BACKOFF_MAX_MS)]
    pub watch_backoff_max_ms: u64,

    /// Delay before restarting the watch stream after it ends or fails (seconds)
    #[arg(long, env = "WATCH_RESTART_DELAY_SECS", default_value_t = DEFAULT_WATCH_RESTART_DELAY_SECS)]
    pub watch_restart_delay_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            keep: DEFAULT_KEEP,
            max_age: Duration::ZERO,
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
            namespace: None,
            request_timeout: Duration::from_secs(30),
            metrics_port: DEFAULT_METRICS_PORT,
            log_format: LogFormat::Text,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_backoff_start_ms: DEFAULT_WATCH_BACKOFF_START_MS,
            watch_backoff_max_ms: DEFAULT_WATCH_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
        }
    }
}

impl ControllerConfig {
    /// Parse flags and environment, then validate
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the parsed values are inconsistent.
    /// Malformed flags make clap print usage and exit.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints clap cannot express
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_reconciles == 0 {
            return Err(ConfigError::Invalid {
                field: "max-concurrent-reconciles",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "request-timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backoff_min_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "backoff-min-secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.backoff_min_secs > self.backoff_max_secs {
            return Err(ConfigError::Invalid {
                field: "backoff-min-secs",
                reason: format!(
                    "must not exceed backoff-max-secs ({} > {})",
                    self.backoff_min_secs, self.backoff_max_secs
                ),
            });
        }
        if self.namespace.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid {
                field: "namespace",
                reason: "must not be empty when set".to_string(),
            });
        }
        Ok(())
    }

    /// Retention policy handed to the garbage collector
    #[must_use]
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep: self.keep,
            max_age: self.max_age,
        }
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}
