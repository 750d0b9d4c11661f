//! Common test utilities
//!
//! Provides an in-memory [`PodClient`] and pod fixtures shared by the
//! reconciler and runtime tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use pod_gc_controller::controller::pods::{PodClient, PodClientError};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const NAMESPACE: &str = "workloads";

/// In-memory pod store that records every call
#[derive(Debug, Default)]
pub struct FakePodClient {
    pods: Mutex<Vec<Pod>>,
    /// Every delete attempted, in order, including failed ones
    delete_attempts: Mutex<Vec<String>>,
    /// Pod names whose delete fails with a timeout
    failing_deletes: Mutex<HashSet<String>>,
    /// Pod names that are listed but already gone when deleted
    vanished: Mutex<HashSet<String>>,
    fail_get: Mutex<bool>,
    fail_list: Mutex<bool>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakePodClient {
    pub fn with_pods(pods: Vec<Pod>) -> Self {
        Self {
            pods: Mutex::new(pods),
            ..Self::default()
        }
    }

    pub fn fail_delete_of(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }

    pub fn vanish_on_delete(&self, name: &str) {
        self.vanished.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_get(&self) {
        *self.fail_get.lock().unwrap() = true;
    }

    pub fn restore_get(&self) {
        *self.fail_get.lock().unwrap() = false;
    }

    pub fn fail_list(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pods
            .lock()
            .unwrap()
            .iter()
            .map(ResourceExt::name_any)
            .collect();
        names.sort();
        names
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn timeout() -> PodClientError {
        PodClientError::Timeout(std::time::Duration::from_secs(30))
    }
}

#[async_trait]
impl PodClient for FakePodClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pod>, PodClientError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_get.lock().unwrap() {
            return Err(Self::timeout());
        }
        Ok(self
            .pods
            .lock()
            .unwrap()
            .iter()
            .find(|pod| pod.namespace().as_deref() == Some(namespace) && pod.name_any() == name)
            .cloned())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Pod>, PodClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_list.lock().unwrap() {
            return Err(Self::timeout());
        }
        Ok(self
            .pods
            .lock()
            .unwrap()
            .iter()
            .filter(|pod| pod.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn delete(&self, pod: &Pod) -> Result<(), PodClientError> {
        let name = pod.name_any();
        let namespace = pod.namespace().unwrap_or_default();
        self.delete_attempts.lock().unwrap().push(name.clone());

        if self.failing_deletes.lock().unwrap().contains(&name) {
            return Err(Self::timeout());
        }

        let mut pods = self.pods.lock().unwrap();
        let vanished = self.vanished.lock().unwrap().contains(&name);
        let before = pods.len();
        pods.retain(|p| !(p.name_any() == name && p.namespace().as_deref() == Some(namespace.as_str())));
        if vanished || pods.len() == before {
            return Err(PodClientError::NotFound { namespace, name });
        }
        Ok(())
    }
}

/// Owner reference to a ReplicaSet
pub fn owner(name: &str) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "ReplicaSet",
        "name": name,
        "uid": format!("uid-{name}"),
        "controller": true,
        "blockOwnerDeletion": true,
    })
}

/// Pod created `age_minutes` ago in [`NAMESPACE`]
pub fn pod(name: &str, age_minutes: i64, phase: &str, reason: Option<&str>, owners: &[Value]) -> Pod {
    let created = (Utc::now() - Duration::minutes(age_minutes))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": NAMESPACE,
            "creationTimestamp": created,
            "ownerReferences": owners,
        },
        "status": { "phase": phase, "reason": reason },
    }))
    .unwrap()
}

pub fn evicted(name: &str, age_minutes: i64, owners: &[Value]) -> Pod {
    pod(name, age_minutes, "Failed", Some("Evicted"), owners)
}

pub fn running(name: &str, age_minutes: i64, owners: &[Value]) -> Pod {
    pod(name, age_minutes, "Running", None, owners)
}
