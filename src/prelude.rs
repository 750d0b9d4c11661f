//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use pod_gc_controller::prelude::*;
//! ```

pub use crate::config::{ConfigError, ControllerConfig, LogFormat};

pub use crate::controller::pods::{KubePodClient, PodClient, PodClientError};

pub use crate::controller::reconciler::{
    GarbageCollector, GcAction, ReconcileOutcome, ReconcilerError, RetentionPolicy,
};

pub use crate::runtime::{ControllerContext, InitializationResult};
