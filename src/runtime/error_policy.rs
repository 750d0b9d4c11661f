//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::backoff::BackoffState;
use crate::controller::pods::PodClient;
use crate::controller::reconciler::ReconcilerError;
use crate::observability::metrics;
use crate::runtime::context::{object_key, pod_key, ControllerContext};
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::controller::{self, Action};
use kube_runtime::watcher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Error type yielded by the controller stream
pub type ControllerError = controller::Error<ReconcilerError, watcher::Error>;

/// Handle reconciliation errors with per-pod Fibonacci backoff
///
/// Backoff state is tracked per pod so one failing pod does not slow down
/// retries of the others.
pub fn handle_reconciliation_error<C: PodClient>(
    pod: Arc<Pod>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext<C>>,
) -> Action {
    let key = pod_key(&pod);

    error!(pod = key.as_str(), error = %error, "reconciliation error");
    metrics::increment_reconciliation_errors();

    let (backoff_seconds, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(key.clone())
                .or_insert_with(|| BackoffState::new(ctx.backoff_min_secs, ctx.backoff_max_secs));
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!(
                "Failed to lock backoff_states: {}, using minimum backoff",
                e
            );
            (ctx.backoff_min_secs, 0)
        }
    };

    info!(
        pod = key.as_str(),
        "Retrying in {}s (error count: {}, trigger source: error-backoff)",
        backoff_seconds,
        error_count
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Classification of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401: credentials or RBAC revoked
    Unauthorized,
    /// 410: resource version too old, the watch relists
    Expired,
    /// 429: API server storage (re)initializing or throttling
    TooManyRequests,
    /// 404 on the watched resource
    NotFound,
    Other,
}

impl WatchErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Expired => "expired",
            Self::TooManyRequests => "too_many_requests",
            Self::NotFound => "not_found",
            Self::Other => "other",
        }
    }
}

/// Classify a watch error from its debug representation
#[must_use]
pub fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    // 404 first: a plain-text 404 body surfaces as a serde error that mentions WatchFailed
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    if is_not_found {
        return WatchErrorKind::NotFound;
    }
    if error_string.contains("401") || error_string.contains("Unauthorized") {
        return WatchErrorKind::Unauthorized;
    }
    if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone")
    {
        return WatchErrorKind::Expired;
    }
    if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        return WatchErrorKind::TooManyRequests;
    }
    WatchErrorKind::Other
}

/// Handle an error yielded by the controller stream
///
/// Failed reconciliations were already requeued by
/// [`handle_reconciliation_error`], so they are only counted here. A pod that
/// disappeared before its requeue fired drops its backoff state. Everything
/// else is a watch or queue failure and goes through
/// [`handle_watch_stream_error`].
///
/// Returns `true` when the event should be passed through, `false` to drop it.
pub async fn handle_controller_error<C: PodClient>(
    error: &ControllerError,
    ctx: &ControllerContext<C>,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    restart_delay: Duration,
) -> bool {
    match error {
        controller::Error::ReconcilerFailed(source, obj_ref) => {
            metrics::increment_watch_errors("reconciler_failed");
            debug!(pod = %obj_ref, error = %source, "reconcile failed, retry scheduled");
            false
        }
        controller::Error::ObjectNotFound(obj_ref) => {
            metrics::increment_watch_errors(WatchErrorKind::NotFound.as_str());
            ctx.reset_backoff(&object_key(obj_ref));
            debug!(pod = %obj_ref, "pod gone before requeue, dropping backoff state");
            true
        }
        other => {
            handle_watch_stream_error(
                &format!("{other:?}"),
                backoff_ms,
                max_backoff_ms,
                restart_delay,
            )
            .await
        }
    }
}

/// Handle watch stream errors with classification and backoff
///
/// Returns `true` when the event should be passed through, `false` to drop it.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    restart_delay: Duration,
) -> bool {
    let kind = classify_watch_error(error_string);
    metrics::increment_watch_errors(kind.as_str());

    match kind {
        WatchErrorKind::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired");
            error!("Verify the controller's ClusterRole grants get, list, watch and delete on pods:");
            error!("  kubectl auth can-i delete pods --as=system:serviceaccount:<namespace>:pod-gc-controller --all-namespaces");
            warn!(
                "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                restart_delay.as_secs()
            );
            tokio::time::sleep(restart_delay).await;
            false
        }
        WatchErrorKind::Expired => {
            warn!("Watch resource version expired (410), watch will relist");
            false
        }
        WatchErrorKind::TooManyRequests => {
            let current = backoff_ms.load(Ordering::Relaxed);
            warn!(
                "API server throttling or reinitializing (429), backing off for {}ms...",
                current
            );
            tokio::time::sleep(Duration::from_millis(current)).await;
            backoff_ms.store(current.saturating_mul(2).min(max_backoff_ms), Ordering::Relaxed);
            false
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Watched pod not found (404), it was probably deleted. Error: {}",
                error_string
            );
            true
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(restart_delay).await;
            false
        }
    }
}
