// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing, authorization filtering, and event conversion.
//!
//! Determines whether an incoming Telegram message should be processed
//! based on chat type and the allowlist, then converts it into a
//! transport-agnostic [`InboundEvent`].

use confab_core::types::{
    FileRef, InboundContent, InboundEvent, MessageRef, UserCommand, UserProfile,
};
use teloxide::prelude::*;
use teloxide::types::ChatKind;

/// Checks whether the message sender is authorized.
///
/// The allowlist holds numeric Telegram user ids. An empty list admits
/// everyone; a non-empty list admits exactly its members. Messages without
/// a sender (channel posts) are rejected when a list is configured.
pub fn is_authorized(msg: &Message, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }

    let user = match msg.from.as_ref() {
        Some(u) => u,
        None => return false,
    };

    allowed_users.contains(&(user.id.0 as i64))
}

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Parses a slash command, tolerating the `@BotName` suffix Telegram
/// appends in some clients. Returns `None` for non-command text.
pub fn parse_command(text: &str) -> Option<UserCommand> {
    if !text.starts_with('/') {
        return None;
    }

    let word = text.split_whitespace().next().unwrap_or(text);
    let bare = word.split('@').next().unwrap_or(word);

    Some(match bare {
        "/start" => UserCommand::Start,
        "/clear" => UserCommand::Clear,
        "/delete" => UserCommand::DeleteLast,
        "/delete_all" => UserCommand::DeleteAll,
        "/deposit" => UserCommand::Deposit,
        _ => UserCommand::Unknown(text.to_string()),
    })
}

/// Converts a Telegram message into an [`InboundEvent`].
///
/// Payment confirmations take precedence over everything else; then text
/// (command or conversation), then voice. Anything else maps to
/// [`InboundContent::Unsupported`].
pub fn to_inbound_event(msg: &Message) -> InboundEvent {
    let content = if let Some(payment) = msg.successful_payment() {
        InboundContent::PaymentConfirmed {
            amount_minor: i64::from(payment.total_amount),
            currency: payment.currency.to_string(),
        }
    } else if let Some(text) = msg.text() {
        match parse_command(text) {
            Some(command) => InboundContent::Command(command),
            None => InboundContent::Text(text.to_string()),
        }
    } else if let Some(voice) = msg.voice() {
        InboundContent::Voice {
            file: FileRef(voice.file.id.to_string()),
            duration_secs: Some(voice.duration.seconds()),
        }
    } else {
        InboundContent::Unsupported
    };

    InboundEvent {
        message: MessageRef(msg.id.0.to_string()),
        user: profile_of(msg),
        content,
        received_at: msg.date.to_rfc3339(),
    }
}

/// The user identity behind a message.
///
/// The user id is the chat id: in the DM-only model they coincide, and the
/// chat id is what replies and deletes are addressed to.
fn profile_of(msg: &Message) -> UserProfile {
    let first_name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "there".to_string());
    let last_name = msg.from.as_ref().and_then(|u| u.last_name.clone());

    UserProfile {
        user_id: msg.chat.id.0.to_string(),
        first_name,
        last_name,
    }
}
