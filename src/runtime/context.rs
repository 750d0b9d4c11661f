//! # Controller Context
//!
//! State shared by every reconciliation dispatched by the watch loop, and the
//! adapter from `kube-runtime`'s `(Arc<Pod>, Arc<Context>)` calling convention
//! to [`GarbageCollector::reconcile`].

use crate::controller::backoff::BackoffState;
use crate::controller::pods::PodClient;
use crate::controller::reconciler::{GarbageCollector, GcAction, ReconcilerError};
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use kube_runtime::reflector::ObjectRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, warn, Instrument};

/// Context handed to every reconciliation
///
/// The collector itself is stateless. Backoff state belongs to the
/// dispatcher and is keyed by `namespace/name`.
#[derive(Debug)]
pub struct ControllerContext<C> {
    pub collector: GarbageCollector<C>,
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
    pub backoff_min_secs: u64,
    pub backoff_max_secs: u64,
}

impl<C: PodClient> ControllerContext<C> {
    #[must_use]
    pub fn new(collector: GarbageCollector<C>, backoff_min_secs: u64, backoff_max_secs: u64) -> Self {
        Self {
            collector,
            backoff_states: Mutex::new(HashMap::new()),
            backoff_min_secs,
            backoff_max_secs,
        }
    }

    /// Forget the error history of a pod after a successful reconciliation
    pub fn reset_backoff(&self, key: &str) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(key);
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }
}

/// `namespace/name` key of a pod
#[must_use]
pub fn pod_key(pod: &Pod) -> String {
    format!(
        "{}/{}",
        pod.namespace().as_deref().unwrap_or(""),
        pod.name_any()
    )
}

/// `namespace/name` key of an object reference yielded by the controller stream
#[must_use]
pub fn object_key(obj_ref: &ObjectRef<DynamicObject>) -> String {
    format!(
        "{}/{}",
        obj_ref.namespace.as_deref().unwrap_or(""),
        obj_ref.name
    )
}

/// Reconcile a pod delivered by the watch
///
/// Only the pod's identity is used; the collector re-fetches it.
///
/// # Errors
///
/// Propagates [`ReconcilerError`] so the error policy can schedule a retry.
pub async fn reconcile_pod<C: PodClient>(
    pod: Arc<Pod>,
    ctx: Arc<ControllerContext<C>>,
) -> Result<Action, ReconcilerError> {
    let name = pod.name_any();
    let Some(namespace) = pod.namespace() else {
        warn!(pod = name.as_str(), "pod event without namespace, ignoring");
        return Ok(Action::await_change());
    };

    let span = tracing::info_span!(
        "controller.reconcile",
        pod = name.as_str(),
        namespace = namespace.as_str()
    );

    async move {
        metrics::increment_reconciliations();
        let start = Instant::now();
        let result = ctx.collector.reconcile(&namespace, &name).await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let outcome = result?;
        ctx.reset_backoff(&format!("{namespace}/{name}"));

        match outcome.action {
            GcAction::Retained { kept, deleted } => {
                debug!(kept = kept, deleted = deleted, "owner group reconciled");
            }
            action => debug!(action = ?action, "pod reconciled"),
        }

        Ok(match outcome.requeue_after {
            Some(delay) => {
                metrics::increment_requeues_total("max_age");
                Action::requeue(delay)
            }
            None => Action::await_change(),
        })
    }
    .instrument(span)
    .await
}
