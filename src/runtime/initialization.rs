//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, probe server
//! startup, Kubernetes client setup and the garbage collector itself.

use crate::config::{ControllerConfig, LogFormat};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::controller::pods::KubePodClient;
use crate::controller::reconciler::{is_evicted, GarbageCollector};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::runtime::context::ControllerContext;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Pod API the watch runs against (namespaced or cluster-wide)
    pub pods: Api<Pod>,
    /// Shared reconciliation context
    pub context: Arc<ControllerContext<KubePodClient>>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when the crypto provider, tracing, metrics or the Kubernetes client
/// cannot be set up.
pub async fn initialize(config: &ControllerConfig) -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is set via features
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_existing| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing(config.log_format)?;

    info!("Starting Pod GC Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        keep = config.keep,
        max_age = ?config.max_age,
        max_concurrent_reconciles = config.max_concurrent_reconciles,
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        request_timeout = ?config.request_timeout,
        "Loaded configuration"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let pods: Api<Pod> = match config.namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    summarize_evicted_pods(&pods).await;

    let collector = GarbageCollector::new(
        KubePodClient::new(client, config.request_timeout),
        config.retention_policy(),
    );
    let context = Arc::new(ControllerContext::new(
        collector,
        config.backoff_min_secs,
        config.backoff_max_secs,
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        pods,
        context,
        server_state,
    })
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Check pods are listable and log how many evicted pods exist per namespace
///
/// Failure is logged, not fatal: the watch retries on its own.
async fn summarize_evicted_pods(pods: &Api<Pod>) {
    match pods.list(&ListParams::default()).await {
        Ok(list) => {
            let mut evicted_by_namespace: BTreeMap<String, usize> = BTreeMap::new();
            for pod in list.items.iter().filter(|pod| is_evicted(pod)) {
                *evicted_by_namespace
                    .entry(pod.namespace().unwrap_or_default())
                    .or_default() += 1;
            }

            info!(
                "Pods are queryable: {} pods, {} evicted across {} namespaces",
                list.items.len(),
                evicted_by_namespace.values().sum::<usize>(),
                evicted_by_namespace.len()
            );
            for (namespace, count) in &evicted_by_namespace {
                info!(namespace = namespace.as_str(), evicted = count, "evicted pods found");
            }
        }
        Err(e) => {
            error!("Pods are not queryable: {:?}", e);
            error!("The controller needs get, list, watch and delete on pods");
            warn!("Continuing despite failed startup check - the watch will retry");
        }
    }
}
