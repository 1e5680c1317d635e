// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the agent loop monitors. Per-user workers
//! are drained before the process exits; a second signal exits at once.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. A second signal while draining forces an immediate exit.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");

        wait_for_signal().await;
        warn!("second signal received, exiting immediately");
        std::process::exit(130);
    });

    token
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = ctrl_c => {
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }
}

/// Awaits per-user worker tasks for up to `timeout`.
///
/// Callers must have dropped the worker senders first so each worker sees
/// a closed queue and finishes its in-flight event. Workers still running
/// at the deadline are aborted.
pub async fn drain_workers(handles: Vec<(String, JoinHandle<()>)>, timeout: Duration) {
    if handles.is_empty() {
        info!("no active workers to drain");
        return;
    }

    info!(count = handles.len(), "waiting for workers to complete");

    let deadline = tokio::time::Instant::now() + timeout;
    let mut interrupted = 0usize;

    for (user_id, handle) in handles {
        let abort = handle.abort_handle();
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(())) => debug!(user_id = %user_id, "worker drained"),
            Ok(Err(e)) => warn!(user_id = %user_id, error = %e, "worker ended abnormally"),
            Err(_) => {
                abort.abort();
                interrupted += 1;
                warn!(user_id = %user_id, "drain timeout reached, aborting worker");
            }
        }
    }

    if interrupted == 0 {
        info!("all workers drained successfully");
    } else {
        warn!(remaining = interrupted, "timeout reached, some workers interrupted");
    }
}
