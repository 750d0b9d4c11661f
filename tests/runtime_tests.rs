//! # Runtime Tests
//!
//! Exercises the `kube-runtime` adapter and error policy against the
//! in-memory pod store.

mod common;

use common::{evicted, owner, running, FakePodClient, NAMESPACE};
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::controller::{self, Action};
use kube_runtime::reflector::ObjectRef;
use pod_gc_controller::controller::pods::PodClientError;
use pod_gc_controller::controller::reconciler::{
    GarbageCollector, ReconcilerError, RetentionPolicy,
};
use pod_gc_controller::runtime::{
    handle_controller_error, handle_reconciliation_error, reconcile_pod, ControllerContext,
    ControllerError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn context(
    pods: Vec<k8s_openapi::api::core::v1::Pod>,
    max_age: Duration,
) -> Arc<ControllerContext<FakePodClient>> {
    let collector = GarbageCollector::new(
        FakePodClient::with_pods(pods),
        RetentionPolicy { keep: 1, max_age },
    );
    Arc::new(ControllerContext::new(collector, 5, 60))
}

#[tokio::test]
async fn test_retention_requeues_after_max_age() {
    let web = owner("web");
    let trigger = evicted("web-2", 10, &[web.clone()]);
    let ctx = context(
        vec![evicted("web-1", 20, &[web]), trigger.clone()],
        Duration::from_secs(3600),
    );

    let action = reconcile_pod(Arc::new(trigger), ctx.clone()).await.unwrap();

    assert_eq!(action, Action::requeue(Duration::from_secs(3600)));
    assert_eq!(ctx.collector.client().delete_attempts(), ["web-1"]);
}

#[tokio::test]
async fn test_no_requeue_without_max_age() {
    let trigger = running("web-1", 10, &[owner("web")]);
    let ctx = context(vec![trigger.clone()], Duration::ZERO);

    let action = reconcile_pod(Arc::new(trigger), ctx).await.unwrap();

    assert_eq!(action, Action::await_change());
}

#[tokio::test]
async fn test_reconcile_uses_fresh_state_not_event_payload() {
    // The watch delivered an evicted pod, but the API server says it is running
    let stale = evicted("web-1", 10, &[owner("web")]);
    let ctx = context(vec![running("web-1", 10, &[owner("web")])], Duration::ZERO);

    reconcile_pod(Arc::new(stale), ctx.clone()).await.unwrap();

    assert_eq!(ctx.collector.client().get_calls(), 1);
    assert!(ctx.collector.client().delete_attempts().is_empty());
}

#[tokio::test]
async fn test_pod_without_namespace_is_ignored() {
    let mut pod = evicted("web-1", 10, &[owner("web")]);
    pod.metadata.namespace = None;
    let ctx = context(Vec::new(), Duration::ZERO);

    let action = reconcile_pod(Arc::new(pod), ctx.clone()).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(ctx.collector.client().get_calls(), 0);
}

#[tokio::test]
async fn test_error_policy_backs_off_per_pod_and_resets_on_success() {
    let web = owner("web");
    let failing = evicted("web-1", 10, &[web.clone()]);
    let other = evicted("web-2", 10, &[web]);
    let ctx = context(vec![failing.clone()], Duration::ZERO);
    ctx.collector.client().fail_get();

    let error = reconcile_pod(Arc::new(failing.clone()), ctx.clone())
        .await
        .unwrap_err();

    let failing = Arc::new(failing);
    let delays: Vec<Action> = (0..4)
        .map(|_| handle_reconciliation_error(failing.clone(), &error, ctx.clone()))
        .collect();
    assert_eq!(
        delays,
        [5, 5, 10, 15].map(|secs| Action::requeue(Duration::from_secs(secs)))
    );

    // Another pod starts from the minimum
    assert_eq!(
        handle_reconciliation_error(Arc::new(other), &error, ctx.clone()),
        Action::requeue(Duration::from_secs(5))
    );

    // A successful reconcile of the same pod starts it over
    ctx.collector.client().restore_get();
    reconcile_pod(failing.clone(), ctx.clone()).await.unwrap();
    assert!(!ctx
        .backoff_states
        .lock()
        .unwrap()
        .contains_key(&format!("{NAMESPACE}/web-1")));
    assert_eq!(
        handle_reconciliation_error(failing, &error, ctx),
        Action::requeue(Duration::from_secs(5))
    );
}

fn object_ref(name: &str) -> ObjectRef<kube::api::DynamicObject> {
    ObjectRef::<Pod>::new(name).within(NAMESPACE).erase()
}

fn delete_timeout(name: &str) -> ReconcilerError {
    ReconcilerError::Delete {
        namespace: NAMESPACE.to_string(),
        name: name.to_string(),
        source: PodClientError::Timeout(Duration::from_secs(30)),
    }
}

#[tokio::test]
async fn test_failed_reconcile_does_not_stall_the_stream() {
    let ctx = context(Vec::new(), Duration::ZERO);
    let backoff_ms = AtomicU64::new(1000);
    let error: ControllerError =
        controller::Error::ReconcilerFailed(delete_timeout("web-1"), object_ref("web-1"));

    let start = Instant::now();
    let pass_through = tokio::time::timeout(
        Duration::from_secs(5),
        handle_controller_error(&error, &ctx, &backoff_ms, 30_000, Duration::from_secs(60)),
    )
    .await
    .expect("handler must not sleep on reconcile failures");

    assert!(!pass_through);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(backoff_ms.load(Ordering::Relaxed), 1000);
}

#[tokio::test]
async fn test_deleted_pods_drop_their_backoff_state() {
    let ctx = context(Vec::new(), Duration::ZERO);
    let backoff_ms = AtomicU64::new(1000);
    let names: Vec<String> = (0..100).map(|i| format!("web-{i}")).collect();

    for name in &names {
        let pod = Arc::new(evicted(name, 10, &[owner("web")]));
        let _requeue = handle_reconciliation_error(pod, &delete_timeout(name), ctx.clone());
    }
    assert_eq!(ctx.backoff_states.lock().unwrap().len(), 100);

    for name in &names {
        let error: ControllerError = controller::Error::ObjectNotFound(object_ref(name));
        let pass_through =
            handle_controller_error(&error, &ctx, &backoff_ms, 30_000, Duration::from_secs(60))
                .await;
        assert!(pass_through);
    }

    assert!(ctx.backoff_states.lock().unwrap().is_empty());
}
