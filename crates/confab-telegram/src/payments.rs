// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Payments wiring: deposit buttons, invoices, and precheckout.
//!
//! The deposit menu buttons carry `deposit:{amount_minor}` callback data.
//! A tapped button becomes an invoice stamped with the configured payload;
//! precheckout approves only invoices carrying that stamp. The confirmed
//! payment then arrives as a regular message update and flows to the agent
//! as a payment event.

use confab_config::model::PaymentsConfig;
use confab_core::ConfabError;
use teloxide::prelude::*;
use teloxide::types::LabeledPrice;
use tracing::{debug, info, warn};

/// Parses `deposit:{amount_minor}` callback data.
pub fn parse_deposit_callback(data: &str) -> Option<i64> {
    let amount = data.strip_prefix("deposit:")?;
    amount.parse::<i64>().ok().filter(|a| *a > 0)
}

/// Checks that a precheckout payload is one this bot issued.
pub fn validate_payload(expected: &str, got: &str) -> Result<(), ConfabError> {
    if expected == got {
        Ok(())
    } else {
        Err(ConfabError::PaymentPayloadMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        })
    }
}

/// The invoice line for a deposit of `amount_minor`.
pub fn invoice_price(amount_minor: i64) -> LabeledPrice {
    LabeledPrice {
        label: format!("${}", amount_minor / 100),
        amount: u32::try_from(amount_minor).unwrap_or(u32::MAX),
    }
}

/// Handles a tapped deposit button: acknowledge the tap, then send the
/// invoice for the chosen amount.
pub async fn on_deposit_callback(
    bot: &Bot,
    query: &CallbackQuery,
    payments: &PaymentsConfig,
) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(amount_minor) = parse_deposit_callback(data) else {
        debug!(data = %data, "ignoring unrecognized callback data");
        return Ok(());
    };
    let Some(chat_id) = query.message.as_ref().map(|m| m.chat().id) else {
        warn!("deposit callback without an originating message");
        return Ok(());
    };
    let Some(token) = payments.provider_token.as_deref() else {
        warn!("deposit callback received but no provider token is configured");
        return Ok(());
    };

    info!(chat_id = chat_id.0, amount_minor, "sending deposit invoice");

    bot.send_invoice(
        chat_id,
        "Confab credit".to_string(),
        "Conversation credit for the Confab assistant".to_string(),
        payments.payload.clone(),
        payments.currency.clone(),
        vec![invoice_price(amount_minor)],
    )
    .provider_token(token.to_string())
    .await?;

    Ok(())
}

/// Answers a precheckout query: approve our own invoices, refuse the rest.
pub async fn on_pre_checkout(
    bot: &Bot,
    query: &PreCheckoutQuery,
    payments: &PaymentsConfig,
) -> ResponseResult<()> {
    match validate_payload(&payments.payload, &query.invoice_payload) {
        Ok(()) => {
            debug!(user_id = query.from.id.0, "precheckout approved");
            bot.answer_pre_checkout_query(query.id.clone(), true).await?;
        }
        Err(e) => {
            warn!(user_id = query.from.id.0, error = %e, "precheckout refused");
            bot.answer_pre_checkout_query(query.id.clone(), false)
                .error_message("Something went wrong...")
                .await?;
        }
    }
    Ok(())
}
