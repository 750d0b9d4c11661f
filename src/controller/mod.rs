//! # Controller
//!
//! Core controller modules for the Pod GC Controller.
//!
//! - `backoff`: Fibonacci backoff for retrying failed reconciliations
//! - `pods`: Pod client seam over the Kubernetes API
//! - `reconciler`: Evicted pod garbage collection
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod pods;
pub mod reconciler;
pub mod server;
