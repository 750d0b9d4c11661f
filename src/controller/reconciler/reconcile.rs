//! # Reconcile
//!
//! The per-pod reconciliation flow.

use crate::controller::pods::{PodClient, PodClientError};
use crate::controller::reconciler::eligibility::{is_evicted, is_expired};
use crate::controller::reconciler::retention::{garbage_set, select_victims};
use crate::controller::reconciler::{
    GarbageCollector, GcAction, ReconcileOutcome, ReconcilerError,
};
use crate::observability::metrics;
use chrono::Utc;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, info};

/// Why a pod was deleted, used as the metric label
#[derive(Debug, Clone, Copy)]
enum DeleteReason {
    MaxAge,
    Retention,
}

impl DeleteReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::MaxAge => "max_age",
            Self::Retention => "retention",
        }
    }
}

impl<C: PodClient> GarbageCollector<C> {
    /// Reconcile the pod identified by `namespace`/`name`
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError`] when fetching, listing or deleting fails for
    /// any reason other than the pod being gone. Deletes stop at the first
    /// failure; pods already deleted stay deleted and the remainder is picked
    /// up by the next reconciliation.
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        let pod = match self.client.get(namespace, name).await {
            Ok(Some(pod)) => pod,
            Ok(None) => return Ok(ReconcileOutcome::done(GcAction::NotFound)),
            Err(e) if e.is_not_found() => return Ok(ReconcileOutcome::done(GcAction::NotFound)),
            Err(source) => {
                return Err(ReconcilerError::Fetch {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source,
                })
            }
        };

        let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
        let reason = pod.status.as_ref().and_then(|s| s.reason.as_deref());
        debug!(
            pod = name,
            namespace = namespace,
            phase = phase.unwrap_or(""),
            reason = reason.unwrap_or(""),
            keep = self.policy.keep,
            max_age = ?self.policy.max_age,
            "reconciling pod"
        );

        if !is_evicted(&pod) {
            return Ok(ReconcileOutcome::done(GcAction::Skipped));
        }

        if is_expired(&pod, self.policy.max_age, Utc::now()) {
            info!(
                pod = name,
                namespace = namespace,
                "garbage collect pod due to max age"
            );
            self.delete(&pod, DeleteReason::MaxAge).await?;
            return Ok(ReconcileOutcome::done(GcAction::Expired));
        }

        let pods = self
            .client
            .list(namespace)
            .await
            .map_err(|source| ReconcilerError::List {
                namespace: namespace.to_string(),
                source,
            })?;

        debug!(
            pod = name,
            namespace = namespace,
            "check pod owner group for garbage collection"
        );

        let garbage = garbage_set(&pod, pods);
        let total = garbage.len();
        let victims = select_victims(garbage, self.policy.keep);
        let deleted = victims.len();

        for victim in &victims {
            info!(
                pod = victim.name_any().as_str(),
                namespace = namespace,
                "delete evicted pod"
            );
            self.delete(victim, DeleteReason::Retention).await?;
        }

        Ok(ReconcileOutcome {
            action: GcAction::Retained {
                kept: total - deleted,
                deleted,
            },
            requeue_after: self.policy.requeue_after(),
        })
    }

    async fn delete(&self, pod: &Pod, reason: DeleteReason) -> Result<(), ReconcilerError> {
        match self.client.delete(pod).await {
            Ok(()) => {
                metrics::increment_pods_deleted(reason.as_str());
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    pod = pod.name_any().as_str(),
                    namespace = pod.namespace().as_deref().unwrap_or(""),
                    "pod already deleted"
                );
                Ok(())
            }
            Err(source) => Err(delete_error(pod, source)),
        }
    }
}

fn delete_error(pod: &Pod, source: PodClientError) -> ReconcilerError {
    ReconcilerError::Delete {
        namespace: pod.namespace().unwrap_or_default(),
        name: pod.name_any(),
        source,
    }
}
