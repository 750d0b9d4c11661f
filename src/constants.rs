//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! command-line flags or environment variables where applicable.

/// Pod phase marking a terminally failed pod
pub const POD_PHASE_FAILED: &str = "Failed";

/// Status reason set by the kubelet when it evicts a pod from its node
pub const POD_REASON_EVICTED: &str = "Evicted";

/// Default number of evicted pods retained per owner
pub const DEFAULT_KEEP: usize = 10;

/// Default maximum age of an evicted pod (`0` disables age-based collection)
pub const DEFAULT_MAX_AGE: &str = "0";

/// Default number of pods reconciled in parallel
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 1;

/// Default timeout applied to every Kubernetes API request
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default Fibonacci backoff lower bound after a failed reconciliation (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default Fibonacci backoff upper bound after a failed reconciliation (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default exponential backoff starting value for watch stream errors (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_START_MS: u64 = 1000;

/// Default exponential backoff maximum value for watch stream errors (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting the watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "pod_gc_controller=info";
