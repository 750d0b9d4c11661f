//! # Pod GC Controller
//!
//! A Kubernetes controller that garbage collects evicted pods.
//!
//! ## Overview
//!
//! Evicted pods stay in the API server until something deletes them. This
//! controller watches pods and, for each evicted pod:
//!
//! 1. **Age limit** - deletes it once it is older than `--max-age`
//! 2. **Retention** - otherwise keeps only the `--keep` newest evicted pods
//!    sharing an owner reference with it and deletes the rest
//! 3. **Requeue** - reconciles it again after `--max-age` so the age limit is
//!    enforced even when no further events arrive
//!
//! ## Configuration
//!
//! Every flag has an environment variable fallback, see `--help`.

use anyhow::Result;
use pod_gc_controller::config::ControllerConfig;
use pod_gc_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::load()?;
    let init = initialize(&config).await?;

    run_watch_loop(init.pods, init.context, init.server_state, &config).await
}
