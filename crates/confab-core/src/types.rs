// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Confab pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque transport-level identifier for a delivered message.
///
/// Only the transport that issued a ref can interpret it; everything else
/// stores and passes it back verbatim (deletes, reply threading).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque transport-level identifier for a downloadable file (voice notes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub String);

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`crate::traits::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Responder,
    Transcriber,
    Storage,
}

/// One user/assistant exchange, the unit of durable history.
///
/// A turn is written atomically after generation succeeds; there is no
/// state in which only half of it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user_id: String,
    /// The user's message, already normalized to text (voice is transcribed
    /// before a turn exists).
    pub input: String,
    /// The generated reply as delivered.
    pub output: String,
    /// UTC timestamp, RFC 3339 with millisecond precision.
    pub created_at: String,
}

/// Identity of the person behind an inbound event.
///
/// Refreshed in storage on every interaction so names stay current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl UserProfile {
    /// The name the responder sees and replies address.
    pub fn display_name(&self) -> &str {
        &self.first_name
    }
}

/// An inbound event received from a transport adapter.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Transport ref of the message that carried this event.
    pub message: MessageRef,
    pub user: UserProfile,
    pub content: InboundContent,
    /// UTC receipt timestamp, RFC 3339.
    pub received_at: String,
}

/// What an inbound event carries.
#[derive(Debug, Clone)]
pub enum InboundContent {
    /// Plain conversational text.
    Text(String),
    /// A voice note; the blob is fetched on demand via the transport.
    Voice {
        file: FileRef,
        duration_secs: Option<u32>,
    },
    /// A recognized (or almost-recognized) slash command.
    Command(UserCommand),
    /// The transport confirmed a completed payment for this user.
    PaymentConfirmed { amount_minor: i64, currency: String },
    /// Media this bot does not handle (stickers, photos, documents).
    Unsupported,
}

/// Commands a user can issue. Anything starting with `/` that is not in
/// this table parses to [`UserCommand::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `/start` -- greeting.
    Start,
    /// `/clear` -- sweep visible messages and wipe stored history.
    Clear,
    /// `/delete` -- undo the last exchange.
    DeleteLast,
    /// `/delete_all` -- wipe stored history without touching the chat.
    DeleteAll,
    /// `/deposit` -- present the credit top-up options.
    Deposit,
    /// Unrecognized command, raw text preserved for the reply.
    Unknown(String),
}

/// An outbound message handed to a transport adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub user_id: String,
    pub text: String,
    /// When set, the transport threads this as a reply to the given message.
    pub reply_to: Option<MessageRef>,
    /// Deposit price options the transport may render natively (buttons);
    /// transports without such UI ignore this.
    pub menu: Option<Vec<PriceOption>>,
}

impl OutboundMessage {
    /// A plain message to a user.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            reply_to: None,
            menu: None,
        }
    }

    /// A message threaded as a reply to `to`.
    pub fn reply(
        user_id: impl Into<String>,
        text: impl Into<String>,
        to: MessageRef,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            reply_to: Some(to),
            menu: None,
        }
    }
}

/// One fixed deposit choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOption {
    /// Button label, e.g. `"$10"`.
    pub label: String,
    /// Amount in the currency's smallest unit (cents for USD).
    pub amount_minor: i64,
}

/// Terminal state of one trip through the turn pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply reached the user.
    Delivered { message: MessageRef },
    /// The turn was turned away before generation; the user was told why.
    Rejected(RejectReason),
    /// The pipeline failed after the gate; the user got a generic line.
    Failed(FailReason),
}

/// Why a turn was rejected before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The voice note could not be fetched or transcribed.
    TranscriptionFailed,
    /// The credit gate said no.
    InsufficientCredit,
}

/// Why a turn failed after passing the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The chain call errored; details stay in the log.
    Generation,
    /// The reply could not be delivered.
    Dispatch,
}

impl std::fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOutcome::Delivered { .. } => write!(f, "delivered"),
            TurnOutcome::Rejected(RejectReason::TranscriptionFailed) => {
                write!(f, "rejected (transcription failed)")
            }
            TurnOutcome::Rejected(RejectReason::InsufficientCredit) => {
                write!(f, "rejected (insufficient credit)")
            }
            TurnOutcome::Failed(FailReason::Generation) => write!(f, "failed (generation)"),
            TurnOutcome::Failed(FailReason::Dispatch) => write!(f, "failed (dispatch)"),
        }
    }
}

/// Current UTC time as RFC 3339 with millisecond precision, the timestamp
/// format used in every row and event this workspace writes.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
