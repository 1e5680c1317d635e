// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop and per-user orchestration for the Confab assistant.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives events from the transport adapter
//! - Routes them to a per-user worker task, preserving arrival order
//! - Runs the turn pipeline and command handlers inside each worker
//! - Handles graceful shutdown with a bounded drain

pub mod commands;
pub mod registry;
pub mod shutdown;
pub mod turn;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use confab_core::types::{InboundContent, InboundEvent};
use confab_core::ConfabError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use registry::SessionRegistry;
pub use turn::{TurnContext, TurnProcessor};

/// The main agent loop coordinating event flow between the transport and
/// the per-user workers.
///
/// Fan-out across users is unbounded; within one user the worker's queue
/// serializes processing, so turns land in history in exactly the order
/// their events arrived, even when generation calls finish out of order.
pub struct AgentLoop {
    ctx: Arc<TurnContext>,
    workers: HashMap<String, mpsc::UnboundedSender<InboundEvent>>,
    handles: Vec<(String, JoinHandle<()>)>,
    drain_timeout: Duration,
}

impl AgentLoop {
    /// Creates an agent loop over the shared context.
    pub fn new(ctx: Arc<TurnContext>) -> Self {
        info!("agent loop initialized");
        Self {
            ctx,
            workers: HashMap::new(),
            handles: Vec::new(),
            drain_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the shutdown drain timeout (tests use a short one).
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Runs the main agent loop until the cancellation token is triggered.
    ///
    /// On cancellation, worker queues are closed, in-flight events are
    /// given a bounded drain window, and storage is closed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ConfabError> {
        info!("agent loop running");

        let transport = Arc::clone(&self.ctx.transport);
        loop {
            tokio::select! {
                event = transport.receive() => {
                    match event {
                        Ok(event) => self.route(event, &cancel),
                        Err(ConfabError::TransportClosed) => {
                            info!("transport closed, stopping agent loop");
                            break;
                        }
                        Err(e) => error!(error = %e, "transport receive error"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        // Close every worker queue, then wait for in-flight events.
        self.workers.clear();
        shutdown::drain_workers(std::mem::take(&mut self.handles), self.drain_timeout).await;

        self.ctx.history.close().await?;

        info!("agent loop stopped");
        Ok(())
    }

    /// Hands the event to the user's worker, spawning one on first contact.
    fn route(&mut self, event: InboundEvent, cancel: &CancellationToken) {
        let user_id = event.user.user_id.clone();

        let event = if let Some(sender) = self.workers.get(&user_id) {
            match sender.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => {
                    // The worker ended (panic or cancellation race);
                    // replace it and redeliver.
                    warn!(user_id = %user_id, "worker queue closed, respawning");
                    self.workers.remove(&user_id);
                    event
                }
            }
        } else {
            event
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(
            Arc::clone(&self.ctx),
            user_id.clone(),
            rx,
            cancel.clone(),
        ));
        // Cannot fail: the worker holds the receiver it was just given.
        let _ = tx.send(event);
        self.workers.insert(user_id.clone(), tx);
        self.handles.push((user_id, handle));
    }
}

/// One worker per user: drains the queue in order until it closes or the
/// service shuts down.
async fn run_worker(
    ctx: Arc<TurnContext>,
    user_id: String,
    mut rx: mpsc::UnboundedReceiver<InboundEvent>,
    cancel: CancellationToken,
) {
    debug!(user_id = %user_id, "worker started");

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => handle_event(&ctx, event).await,
                    None => break,
                }
            }
            _ = cancel.cancelled() => {
                debug!(user_id = %user_id, "worker cancelled");
                break;
            }
        }
    }

    debug!(user_id = %user_id, "worker stopped");
}

/// Dispatches one event: refresh the user row, then run the right handler.
async fn handle_event(ctx: &Arc<TurnContext>, event: InboundEvent) {
    let user_id = event.user.user_id.clone();

    // Every interaction refreshes names and last-seen; the balance column
    // is never touched here.
    if let Err(e) = ctx.history.upsert_user(&event.user).await {
        warn!(user_id = %user_id, error = %e, "user upsert failed");
    }

    let result = match &event.content {
        InboundContent::Text(_) | InboundContent::Voice { .. } => {
            match TurnProcessor::new(Arc::clone(ctx)).process(&event).await {
                Ok(outcome) => {
                    info!(user_id = %user_id, outcome = %outcome, "turn complete");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        InboundContent::Command(command) => {
            let command = command.clone();
            commands::handle(ctx, &event, &command).await
        }
        InboundContent::PaymentConfirmed {
            amount_minor,
            currency,
        } => {
            let (amount_minor, currency) = (*amount_minor, currency.clone());
            commands::handle_payment(ctx, &event, amount_minor, &currency).await
        }
        InboundContent::Unsupported => {
            commands::handle_unsupported(ctx, &event).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(user_id = %user_id, error = %e, "failed to handle event");
    }
}
