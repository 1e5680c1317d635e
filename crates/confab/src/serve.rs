// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `confab serve` command implementation.
//!
//! Wires storage, the credit ledger, and the adapters together, then hands
//! control to the agent loop until a shutdown signal arrives.

use std::sync::Arc;

use confab_agent::shutdown;
use confab_agent::turn::TurnContext;
use confab_agent::{AgentLoop, SessionRegistry};
use confab_chain::ChainResponder;
use confab_config::model::ConfabConfig;
use confab_core::{
    ConfabError, HistoryAdapter, ResponderAdapter, TranscriberAdapter, TransportAdapter,
};
use confab_credit::{CreditLedger, QuotaPolicy};
use confab_speech::SpeechTranscriber;
use confab_storage::SqliteHistory;
use confab_telegram::TelegramTransport;
use tracing::{error, info, warn};

/// Run the `confab serve` command.
pub async fn run(config: ConfabConfig) -> Result<(), ConfabError> {
    init_tracing(&config.agent.log_level);

    info!("starting confab serve");

    // Initialize conversation storage.
    let history = {
        let history = SqliteHistory::new(config.storage.clone());
        history.initialize().await?;
        Arc::new(history)
    };

    // Credit ledger opens its own connection to the same database.
    let ledger = Arc::new(CreditLedger::open(&config.storage.database_path).await?);
    let quota = QuotaPolicy::new(&config.credit);
    if quota.metered() {
        info!(cost_per_turn = quota.cost_per_turn(), "credit metering enabled");
    } else {
        info!("free mode enabled, turns are not metered");
    }

    // Telegram transport.
    let mut transport = TelegramTransport::new(config.telegram.clone(), config.payments.clone())
        .map_err(|e| {
            error!(error = %e, "failed to initialize Telegram transport");
            eprintln!(
                "error: Telegram bot token required. Set via: config or CONFAB_TELEGRAM_BOT_TOKEN env var"
            );
            e
        })?;
    transport.connect().await?;
    let transport: Arc<dyn TransportAdapter> = Arc::new(transport);

    // Chain responder.
    let responder: Arc<dyn ResponderAdapter> = Arc::new(ChainResponder::new(&config.chain)?);
    info!(endpoint = %config.chain.endpoint, "chain responder initialized");

    // Speech transcriber, when configured. Without one the agent still
    // serves text; voice notes get a polite rejection.
    let transcriber: Option<Arc<dyn TranscriberAdapter>> = if config.speech.api_key.is_some() {
        let t = SpeechTranscriber::new(&config.speech)?;
        info!(endpoint = %config.speech.endpoint, "speech transcriber initialized");
        Some(Arc::new(t))
    } else {
        warn!("no speech API key configured, voice messages will be rejected");
        None
    };

    let ctx = Arc::new(TurnContext {
        transport,
        responder,
        transcriber,
        history: history as Arc<dyn HistoryAdapter>,
        ledger,
        quota,
        registry: SessionRegistry::new(),
        payments: config.payments.clone(),
    });

    let cancel = shutdown::install_signal_handler();

    let mut agent_loop = AgentLoop::new(ctx);
    agent_loop.run(cancel).await?;

    info!("confab serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for the serve command.
///
/// Respects `RUST_LOG` when set; otherwise uses the configured log level
/// for confab crates and `warn` for everything else.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("confab={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
