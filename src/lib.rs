//! Pod GC Controller Library
//!
//! Garbage collects evicted pods. For every owner reference, at most `keep`
//! evicted pods are retained, newest first, and any evicted pod older than
//! `max_age` is deleted outright.
//!
//! ## Quick Start
//!
//! ```rust
//! use pod_gc_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod observability;
pub mod prelude;
pub mod runtime;
