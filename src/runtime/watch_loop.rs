//! # Watch Loop
//!
//! Controller watch loop that monitors pods and dispatches a reconciliation
//! for every pod that changes.

use crate::config::ControllerConfig;
use crate::controller::pods::PodClient;
use crate::controller::server::ServerState;
use crate::runtime::context::{reconcile_pod, ControllerContext};
use crate::runtime::error_policy::{handle_controller_error, handle_reconciliation_error};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller watch loop
///
/// Dispatches at most `max_concurrent_reconciles` reconciliations at a time;
/// `kube-runtime` never runs two reconciliations of the same pod concurrently.
/// The loop restarts the controller when its stream ends, until a shutdown
/// signal is received.
///
/// # Errors
///
/// Currently always returns `Ok(())` once shut down.
pub async fn run_watch_loop<C>(
    pods: Api<Pod>,
    context: Arc<ControllerContext<C>>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error>
where
    C: PodClient + 'static,
{
    let backoff_ms = Arc::new(AtomicU64::new(config.watch_backoff_start_ms));

    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.set_ready(false);
    });

    server_state.set_ready(true);

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!(
            keep = context.collector.policy().keep,
            max_age = ?context.collector.policy().max_age,
            concurrency = config.max_concurrent_reconciles,
            "Starting controller watch loop..."
        );

        let backoff = backoff_ms.clone();
        let stream_context = context.clone();
        let watch_backoff_start_ms = config.watch_backoff_start_ms;
        let watch_backoff_max_ms = config.watch_backoff_max_ms;
        let restart_delay = config.watch_restart_delay();

        Controller::new(pods.clone(), watcher::Config::default())
            .with_config(controller::Config::default().concurrency(config.max_concurrent_reconciles))
            .shutdown_on_signal()
            .run(reconcile_pod, handle_reconciliation_error, context.clone())
            .filter_map(move |event| {
                let backoff = backoff.clone();
                let ctx = stream_context.clone();
                async move {
                    let pass_through = match &event {
                        Ok((pod, _action)) => {
                            backoff.store(watch_backoff_start_ms, std::sync::atomic::Ordering::Relaxed);
                            debug!(pod = %pod, "watch.event.reconciled");
                            true
                        }
                        Err(e) => {
                            handle_controller_error(
                                e,
                                &ctx,
                                &backoff,
                                watch_backoff_max_ms,
                                restart_delay,
                            )
                            .await
                        }
                    };
                    pass_through.then_some(event)
                }
            })
            .for_each(|_| futures::future::ready(()))
            .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolves on SIGINT or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
