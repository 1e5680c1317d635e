// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command handlers: `/start`, `/clear`, `/delete`, `/delete_all`,
//! `/deposit`, unknown commands, and confirmed payments.
//!
//! Transport-level deletes are best-effort cleanups; the history store is
//! the authority. The two never form a transaction: each is attempted and
//! each failure is handled on its own.

use std::sync::Arc;

use confab_core::types::{InboundEvent, MessageRef, OutboundMessage, PriceOption, UserCommand};
use confab_core::ConfabError;
use tracing::{debug, error, info, warn};

use crate::turn::{GENERIC_APOLOGY, TurnContext};

const CLEARED: &str = "Conversation cleared.";
const LAST_DELETED: &str = "Last message deleted.";
const ALL_DELETED: &str = "All messages deleted.";
const DEPOSIT_PROMPT: &str = "Choose an amount to deposit:";
const DEPOSIT_UNAVAILABLE: &str = "Deposits are not available right now.";
const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that command.";

/// Dispatches one recognized (or almost-recognized) command.
pub async fn handle(
    ctx: &Arc<TurnContext>,
    event: &InboundEvent,
    command: &UserCommand,
) -> Result<(), ConfabError> {
    match command {
        UserCommand::Start => start(ctx, event).await,
        UserCommand::Clear => clear(ctx, event).await,
        UserCommand::DeleteLast => delete_last(ctx, event).await,
        UserCommand::DeleteAll => delete_all(ctx, event).await,
        UserCommand::Deposit => deposit(ctx, event).await,
        UserCommand::Unknown(raw) => {
            debug!(user_id = %event.user.user_id, command = %raw, "unknown command");
            ctx.send_tracked(event, NOT_UNDERSTOOD).await;
            Ok(())
        }
    }
}

/// Replies to unsupported media (stickers, photos, documents).
pub async fn handle_unsupported(ctx: &Arc<TurnContext>, event: &InboundEvent) {
    debug!(user_id = %event.user.user_id, "unsupported content");
    ctx.send_tracked(event, NOT_UNDERSTOOD).await;
}

/// Greeting for `/start`.
async fn start(ctx: &Arc<TurnContext>, event: &InboundEvent) -> Result<(), ConfabError> {
    let greeting = format!(
        "Hi {}! I'm a bot, please talk to me!",
        event.user.display_name()
    );
    ctx.send_tracked(event, &greeting).await;
    Ok(())
}

/// `/clear`: sweep every message this process still remembers, then wipe
/// the stored history. The two effects are independently fallible.
async fn clear(ctx: &Arc<TurnContext>, event: &InboundEvent) -> Result<(), ConfabError> {
    let user_id = &event.user.user_id;

    let window = ctx.registry.drain_window(user_id);
    let swept = delete_refs(ctx, user_id, &window).await;
    info!(user_id = %user_id, remembered = window.len(), swept, "transport sweep complete");

    match ctx.history.clear(user_id).await {
        Ok(removed) => {
            info!(user_id = %user_id, removed, "history cleared");
            ctx.send_tracked(event, CLEARED).await;
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "history clear failed");
            ctx.send_tracked(event, GENERIC_APOLOGY).await;
        }
    }
    Ok(())
}

/// `/delete`: undo exactly one exchange. Transport deletes are best-effort;
/// the history pop is unconditional; the pointers are cleared afterwards so
/// a repeated `/delete` with no new turn is a clean no-op.
async fn delete_last(ctx: &Arc<TurnContext>, event: &InboundEvent) -> Result<(), ConfabError> {
    let user_id = &event.user.user_id;

    if let Some((user_ref, bot_ref)) = ctx.registry.last_exchange(user_id) {
        let refs: Vec<MessageRef> = [user_ref, bot_ref].into_iter().flatten().collect();
        delete_refs(ctx, user_id, &refs).await;
    } else {
        debug!(user_id = %user_id, "no tracked exchange to delete from the chat");
    }

    match ctx.history.pop_last(user_id, 1).await {
        Ok(removed) => {
            info!(user_id = %user_id, removed, "last exchange popped");
            ctx.registry.clear_exchange(user_id);
            ctx.send_tracked(event, LAST_DELETED).await;
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "history pop failed");
            ctx.send_tracked(event, GENERIC_APOLOGY).await;
        }
    }
    Ok(())
}

/// `/delete_all`: wipe the stored history without touching the chat.
async fn delete_all(ctx: &Arc<TurnContext>, event: &InboundEvent) -> Result<(), ConfabError> {
    let user_id = &event.user.user_id;
    match ctx.history.clear(user_id).await {
        Ok(removed) => {
            info!(user_id = %user_id, removed, "history wiped");
            ctx.send_tracked(event, ALL_DELETED).await;
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "history wipe failed");
            ctx.send_tracked(event, GENERIC_APOLOGY).await;
        }
    }
    Ok(())
}

/// `/deposit`: present the configured price options. How the menu renders
/// is the transport's business.
async fn deposit(ctx: &Arc<TurnContext>, event: &InboundEvent) -> Result<(), ConfabError> {
    if ctx.payments.provider_token.is_none() {
        ctx.send_tracked(event, DEPOSIT_UNAVAILABLE).await;
        return Ok(());
    }

    let menu = price_options(&ctx.payments.amounts);
    let mut msg = OutboundMessage::reply(&event.user.user_id, DEPOSIT_PROMPT, event.message.clone());
    msg.menu = Some(menu);
    match ctx.transport.send(msg).await {
        Ok(sent) => ctx.registry.remember(&event.user.user_id, sent),
        Err(e) => warn!(user_id = %event.user.user_id, error = %e, "failed to send deposit menu"),
    }
    Ok(())
}

/// A confirmed payment arrived from the transport: grant the quota and
/// thank the user with the concrete grant.
pub async fn handle_payment(
    ctx: &Arc<TurnContext>,
    event: &InboundEvent,
    amount_minor: i64,
    currency: &str,
) -> Result<(), ConfabError> {
    let user_id = &event.user.user_id;
    let units = ctx.quota.amount_to_quota(amount_minor);
    let balance = ctx
        .ledger
        .credit(user_id, amount_minor, currency, units)
        .await?;

    info!(user_id = %user_id, amount_minor, currency, units, balance, "payment applied");

    let thanks = format!(
        "Thank you for your payment! You can now use the bot for {}.",
        ctx.quota.describe(units)
    );
    ctx.send_tracked(event, &thanks).await;
    Ok(())
}

/// Builds the deposit menu from whole-dollar amounts.
fn price_options(amounts: &[i64]) -> Vec<PriceOption> {
    amounts
        .iter()
        .map(|amount| PriceOption {
            label: format!("${amount}"),
            amount_minor: amount * 100,
        })
        .collect()
}

/// Deletes each ref best-effort and returns how many the transport
/// actually removed. Already-gone messages and transport faults alike
/// never stop the loop.
async fn delete_refs(ctx: &Arc<TurnContext>, user_id: &str, refs: &[MessageRef]) -> usize {
    let mut removed = 0;
    for message in refs {
        match ctx.transport.delete(user_id, message).await {
            Ok(true) => removed += 1,
            Ok(false) => debug!(user_id = %user_id, message = %message, "message already gone"),
            Err(e) => {
                warn!(user_id = %user_id, message = %message, error = %e, "delete failed")
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_options_convert_to_minor_units() {
        let options = price_options(&[10, 20, 30, 50]);
        assert_eq!(options.len(), 4);
        assert_eq!(options[0].label, "$10");
        assert_eq!(options[0].amount_minor, 1000);
        assert_eq!(options[3].label, "$50");
        assert_eq!(options[3].amount_minor, 5000);
    }

    #[test]
    fn price_options_empty_config() {
        assert!(price_options(&[]).is_empty());
    }
}
