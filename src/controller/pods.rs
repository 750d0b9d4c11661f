//! # Pod Client
//!
//! The read/delete surface the garbage collector needs from the API server.
//!
//! [`PodClient`] is the seam between the reconciliation logic and Kubernetes:
//! production code uses [`KubePodClient`] while tests substitute an in-memory
//! implementation. Every call goes straight to the API server; nothing here
//! caches pods between reconciliations.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams};
use kube::{Client, ResourceExt};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors returned by a [`PodClient`]
#[derive(Debug, Error)]
pub enum PodClientError {
    #[error("pod {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },
    #[error("Kubernetes API request failed: {0}")]
    Api(#[from] kube::Error),
    #[error("Kubernetes API request timed out after {0:?}")]
    Timeout(Duration),
}

impl PodClientError {
    /// Whether the error means the pod no longer exists
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

/// Pod operations consumed by the garbage collector
#[async_trait]
pub trait PodClient: Send + Sync {
    /// Fetch a single pod, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pod>, PodClientError>;

    /// List every pod in a namespace
    ///
    /// Implementations must return a complete snapshot.
    async fn list(&self, namespace: &str) -> Result<Vec<Pod>, PodClientError>;

    /// Delete a pod
    ///
    /// A pod that is already gone yields [`PodClientError::NotFound`].
    async fn delete(&self, pod: &Pod) -> Result<(), PodClientError>;
}

/// [`PodClient`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
    request_timeout: Duration,
}

impl std::fmt::Debug for KubePodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePodClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl KubePodClient {
    #[must_use]
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn bounded<T, F>(&self, request: F) -> Result<T, PodClientError>
    where
        F: Future<Output = Result<T, kube::Error>> + Send,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(PodClientError::from),
            Err(_elapsed) => Err(PodClientError::Timeout(self.request_timeout)),
        }
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pod>, PodClientError> {
        let api = self.api(namespace);
        self.bounded(api.get_opt(name)).await
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Pod>, PodClientError> {
        let api = self.api(namespace);
        // Unpaginated so the API server returns the whole namespace in one response
        let pods = self.bounded(api.list(&ListParams::default())).await?;
        debug!(
            namespace = namespace,
            count = pods.items.len(),
            "listed pods"
        );
        Ok(pods.items)
    }

    async fn delete(&self, pod: &Pod) -> Result<(), PodClientError> {
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();
        let api = self.api(&namespace);

        match self
            .bounded(api.delete(&name, &DeleteParams::default()))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(PodClientError::NotFound { namespace, name }),
            Err(e) => Err(e),
        }
    }
}
