//! # Configuration
//!
//! Controller configuration, fixed at startup and never re-read per reconciliation.
//!
//! - `controller`: flag/environment driven [`ControllerConfig`]
//! - `duration`: duration string parsing for `--max-age` and friends

mod controller;
mod duration;

pub use controller::{ControllerConfig, LogFormat};
pub use duration::parse_duration;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration '{value}': {detail}")]
    InvalidDuration { value: String, detail: String },
    #[error("invalid value for --{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
