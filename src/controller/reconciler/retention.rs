//! # Retention
//!
//! Builds the garbage set for a triggering pod and picks which of its members
//! to delete.

use crate::controller::reconciler::eligibility::{creation_time, is_evicted};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::cmp::Reverse;

/// Whether `candidate` shares at least one owner reference with `trigger`
///
/// References must be equal in every field. A pod without owner references
/// shares nothing, not even with itself.
#[must_use]
pub fn shares_owner(trigger: &Pod, candidate: &Pod) -> bool {
    let trigger_refs = trigger.owner_references();
    candidate
        .owner_references()
        .iter()
        .any(|candidate_ref| trigger_refs.contains(candidate_ref))
}

/// Evicted pods from `pods` that share an owner reference with `trigger`
///
/// `pods` must be a complete listing of the trigger's namespace. The trigger
/// itself is included when it is still evicted and owned.
#[must_use]
pub fn garbage_set(trigger: &Pod, pods: Vec<Pod>) -> Vec<Pod> {
    pods.into_iter()
        .filter(|pod| shares_owner(trigger, pod) && is_evicted(pod))
        .collect()
}

/// Split the garbage set, returning the pods to delete
///
/// Pods are ordered newest first, ties broken by name, pods without a
/// creation timestamp last. The first `keep` are retained and the remainder
/// is returned in that same order.
#[must_use]
pub fn select_victims(mut garbage: Vec<Pod>, keep: usize) -> Vec<Pod> {
    garbage.sort_by_cached_key(|pod| (Reverse(creation_time(pod)), pod.name_any()));
    let keep = keep.min(garbage.len());
    garbage.split_off(keep)
}
