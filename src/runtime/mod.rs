//! # Runtime
//!
//! Wires the garbage collector into `kube-runtime`: process initialization,
//! the watch loop that dispatches reconciliations, and the error policy that
//! decides when a failed pod is retried.

pub mod context;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use context::{reconcile_pod, ControllerContext};
pub use error_policy::{handle_controller_error, handle_reconciliation_error, ControllerError};
pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
