//! # Reconciler
//!
//! Garbage collection of evicted pods.
//!
//! Each reconciliation handles a single pod identity and runs the following
//! steps, stopping at the first one that ends the call:
//!
//! 1. Fetch the pod (a missing pod is a successful no-op)
//! 2. Skip pods that are not `Failed` with reason `Evicted`
//! 3. Delete the pod outright when it is older than `max_age`
//! 4. List the namespace and collect evicted pods sharing an owner reference
//! 5. Keep the `keep` newest of those and delete the rest, oldest last
//! 6. Ask to be requeued after `max_age` so age-based deletion eventually fires
//!
//! The reconciler holds no state between calls. Every call re-fetches and
//! re-lists, so it is safe to run again after a partial failure.

mod eligibility;
mod reconcile;
mod retention;

pub use eligibility::{creation_time, is_evicted, is_expired};
pub use retention::{garbage_set, select_victims, shares_owner};

use crate::controller::pods::{PodClient, PodClientError};
use std::time::Duration;
use thiserror::Error;

/// Retention policy applied to every owner group
///
/// Fixed when the collector is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Evicted pods retained per owner reference
    pub keep: usize,
    /// Age after which an evicted pod is deleted regardless of siblings
    /// (`Duration::ZERO` disables age-based deletion)
    pub max_age: Duration,
}

impl RetentionPolicy {
    /// Delay before the next reconciliation of a retained pod
    #[must_use]
    pub fn requeue_after(&self) -> Option<Duration> {
        (!self.max_age.is_zero()).then_some(self.max_age)
    }
}

/// What a reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcAction {
    /// The pod no longer exists
    NotFound,
    /// The pod is not an evicted pod
    Skipped,
    /// The pod exceeded `max_age` and was deleted
    Expired,
    /// Retention ran over the pod's owner group
    Retained { kept: usize, deleted: usize },
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub action: GcAction,
    /// When to reconcile this pod again absent any new event
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    fn done(action: GcAction) -> Self {
        Self {
            action,
            requeue_after: None,
        }
    }
}

/// Reconciliation errors
///
/// All variants are transient from the collector's point of view; the
/// dispatcher retries with its own backoff.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch pod {namespace}/{name}: {source}")]
    Fetch {
        namespace: String,
        name: String,
        #[source]
        source: PodClientError,
    },
    #[error("failed to list pods in namespace {namespace}: {source}")]
    List {
        namespace: String,
        #[source]
        source: PodClientError,
    },
    #[error("failed to delete pod {namespace}/{name}: {source}")]
    Delete {
        namespace: String,
        name: String,
        #[source]
        source: PodClientError,
    },
}

/// Evicted pod garbage collector
///
/// Stateless apart from its immutable policy, so one instance is shared
/// across concurrent reconciliations of different pods.
#[derive(Debug)]
pub struct GarbageCollector<C> {
    client: C,
    policy: RetentionPolicy,
}

impl<C: PodClient> GarbageCollector<C> {
    #[must_use]
    pub fn new(client: C, policy: RetentionPolicy) -> Self {
        Self { client, policy }
    }

    #[must_use]
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }
}
