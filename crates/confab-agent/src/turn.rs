// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn pipeline: one inbound message in, one delivered reply out.
//!
//! Stage order is deliberate: normalize, authorize, generate, persist,
//! dispatch, record, consume. Persisting before dispatch means history can
//! never silently trail what the user has been shown; the reverse would
//! let a delivered reply vanish from the record and corrupt later context.

use std::sync::Arc;

use confab_config::model::PaymentsConfig;
use confab_core::types::{
    FailReason, InboundContent, InboundEvent, OutboundMessage, RejectReason, Turn,
    TurnOutcome, now_rfc3339,
};
use confab_core::{
    ConfabError, HistoryAdapter, ResponderAdapter, TranscriberAdapter, TransportAdapter,
};
use confab_credit::{CreditLedger, QuotaPolicy};
use tracing::{debug, error, info, warn};

use crate::registry::SessionRegistry;

/// Reply sent when a voice note cannot be fetched or transcribed.
pub const VOICE_APOLOGY: &str = "Sorry, I couldn't understand that voice message.";

/// Reply sent when the credit gate turns a turn away.
pub const CREDIT_DENIAL: &str = "You're out of credit. Use /deposit to top up.";

/// Reply sent on any internal failure after the gate. Detail stays in the log.
pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Shared adapters and policy handed to every worker.
pub struct TurnContext {
    pub transport: Arc<dyn TransportAdapter>,
    pub responder: Arc<dyn ResponderAdapter>,
    /// Absent when no speech service is configured; voice notes are then
    /// rejected the same way a failed transcription is.
    pub transcriber: Option<Arc<dyn TranscriberAdapter>>,
    pub history: Arc<dyn HistoryAdapter>,
    pub ledger: Arc<CreditLedger>,
    pub quota: QuotaPolicy,
    pub registry: SessionRegistry,
    pub payments: PaymentsConfig,
}

impl TurnContext {
    /// Sends a reply threaded to the inbound message and remembers its ref
    /// for later `/clear` sweeps. Send failures are logged and swallowed;
    /// these messages are courtesy output, not pipeline state.
    pub(crate) async fn send_tracked(&self, event: &InboundEvent, text: &str) {
        let msg = OutboundMessage::reply(&event.user.user_id, text, event.message.clone());
        match self.transport.send(msg).await {
            Ok(sent) => {
                self.registry.remember(&event.user.user_id, sent);
                self.registry.remember(&event.user.user_id, event.message.clone());
            }
            Err(e) => warn!(user_id = %event.user.user_id, error = %e, "failed to send notice"),
        }
    }
}

/// Drives one conversational event through the pipeline stages.
pub struct TurnProcessor {
    ctx: Arc<TurnContext>,
}

impl TurnProcessor {
    pub fn new(ctx: Arc<TurnContext>) -> Self {
        Self { ctx }
    }

    /// Processes one text or voice event end to end.
    ///
    /// Returns `Err` only for events that are not conversational input;
    /// every pipeline failure maps to a terminal [`TurnOutcome`] after the
    /// user has been told what they need to know.
    pub async fn process(&self, event: &InboundEvent) -> Result<TurnOutcome, ConfabError> {
        let user_id = event.user.user_id.clone();

        // Normalize: voice becomes text or the turn ends here, unpersisted
        // and uncharged.
        let text = match &event.content {
            InboundContent::Text(text) => text.clone(),
            InboundContent::Voice { file, .. } => match self.transcribe(file).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "voice normalization failed");
                    self.ctx.send_tracked(event, VOICE_APOLOGY).await;
                    return Ok(TurnOutcome::Rejected(RejectReason::TranscriptionFailed));
                }
            },
            other => {
                return Err(ConfabError::Internal(format!(
                    "non-conversational event reached the turn pipeline: {other:?}"
                )));
            }
        };

        // Authorize: a read-only balance check. Nothing is charged yet.
        let cost = self.ctx.quota.cost_per_turn();
        if self.ctx.quota.metered() {
            match self.ctx.ledger.authorize(&user_id, cost).await {
                Ok(()) => {}
                Err(ConfabError::InsufficientCredit { available, .. }) => {
                    info!(user_id = %user_id, available, cost, "turn rejected by credit gate");
                    self.ctx.send_tracked(event, CREDIT_DENIAL).await;
                    return Ok(TurnOutcome::Rejected(RejectReason::InsufficientCredit));
                }
                Err(e) => return Err(e),
            }
        }

        // Generate.
        let reply = match self
            .ctx
            .responder
            .generate(&user_id, &text, event.user.display_name())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "generation failed");
                self.ctx.send_tracked(event, GENERIC_APOLOGY).await;
                return Ok(TurnOutcome::Failed(FailReason::Generation));
            }
        };

        // Persist before dispatch. A store failure still delivers the reply
        // but skips the charge: a rare unrecorded reply beats a user paying
        // for a turn the store lost.
        let turn = Turn {
            user_id: user_id.clone(),
            input: text,
            output: reply.clone(),
            created_at: now_rfc3339(),
        };
        let persisted = match self.ctx.history.append(&turn).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    user_id = %user_id,
                    error = %e,
                    "history append failed; delivering reply without a durable record"
                );
                false
            }
        };

        // Dispatch, threaded to the inbound message.
        let outbound = OutboundMessage::reply(&user_id, reply, event.message.clone());
        let bot_ref = match self.ctx.transport.send(outbound).await {
            Ok(sent) => sent,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "reply dispatch failed");
                return Ok(TurnOutcome::Failed(FailReason::Dispatch));
            }
        };

        // Record pointers for /delete and /clear.
        self.ctx
            .registry
            .record_exchange(&user_id, event.message.clone(), bot_ref.clone());

        // Consume, only for a fully recorded and delivered turn. Losing a
        // consume race to a concurrent spend is logged, not undone.
        if self.ctx.quota.metered() && persisted {
            if let Err(e) = self.ctx.ledger.consume(&user_id, cost).await {
                warn!(user_id = %user_id, error = %e, "post-delivery consume failed");
            }
        }

        debug!(user_id = %user_id, bot_ref = %bot_ref, "turn delivered");
        Ok(TurnOutcome::Delivered { message: bot_ref })
    }

    /// Fetches the voice blob through the transport and transcribes it.
    async fn transcribe(&self, file: &confab_core::FileRef) -> Result<String, ConfabError> {
        let transcriber =
            self.ctx
                .transcriber
                .as_ref()
                .ok_or_else(|| ConfabError::Transcription {
                    message: "no transcription service configured".into(),
                    source: None,
                })?;
        let audio = self.ctx.transport.fetch_file(file).await?;
        transcriber.transcribe(&audio).await
    }
}
