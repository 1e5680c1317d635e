// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport adapter for the Confab assistant.
//!
//! Implements [`TransportAdapter`] for the Telegram Bot API via teloxide,
//! providing long polling, DM filtering, reply threading, message deletion,
//! voice file downloads, and the Telegram Payments deposit flow.

pub mod handler;
pub mod media;
pub mod payments;

use std::sync::Arc;

use async_trait::async_trait;
use confab_config::model::{PaymentsConfig, TelegramConfig};
use confab_core::types::{
    AdapterType, FileRef, HealthStatus, InboundEvent, MessageRef, OutboundMessage, PriceOption,
};
use confab_core::{ConfabError, PluginAdapter, TransportAdapter};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Shared state handed to the dispatcher endpoints.
struct PollState {
    tx: mpsc::Sender<InboundEvent>,
    allowed_users: Vec<i64>,
    payments: PaymentsConfig,
}

/// Telegram transport adapter implementing [`TransportAdapter`].
///
/// Connects via long polling, filters updates to authorized DMs, and
/// forwards everything else to the agent as normalized events.
pub struct TelegramTransport {
    bot: Bot,
    config: TelegramConfig,
    payments: PaymentsConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramTransport {
    /// Creates a new Telegram transport adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig, payments: PaymentsConfig) -> Result<Self, ConfabError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            ConfabError::Config("telegram.bot_token is required for the Telegram transport".into())
        })?;

        if token.is_empty() {
            return Err(ConfabError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            payments,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        debug!("Telegram transport shutting down");
        // The polling handle is dropped with the transport, which aborts
        // the task. For graceful shutdown the agent loop stops calling
        // receive() first.
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for TelegramTransport {
    async fn connect(&mut self) -> Result<(), ConfabError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let state = Arc::new(PollState {
            tx: self.inbound_tx.clone(),
            allowed_users: self.config.allowed_users.clone(),
            payments: self.payments.clone(),
        });

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let tree = dptree::entry()
                .branch(Update::filter_message().endpoint(on_message))
                .branch(Update::filter_callback_query().endpoint(on_callback))
                .branch(Update::filter_pre_checkout_query().endpoint(on_pre_checkout));

            Dispatcher::builder(bot, tree)
                .dependencies(dptree::deps![state])
                .default_handler(|_| async {}) // Silently ignore other updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, ConfabError> {
        let chat_id = parse_chat_id(&msg.user_id)?;

        let mut request = self.bot.send_message(chat_id, &msg.text);

        if let Some(ref reply_to) = msg.reply_to {
            // Threading is best-effort: a ref this transport did not issue
            // just sends unthreaded.
            match reply_to.0.parse::<i32>() {
                Ok(id) => {
                    request = request
                        .reply_parameters(ReplyParameters::new(teloxide::types::MessageId(id)));
                }
                Err(_) => warn!(reply_to = %reply_to, "unparseable reply ref, sending unthreaded"),
            }
        }

        if let Some(ref menu) = msg.menu {
            request = request.reply_markup(InlineKeyboardMarkup::new(menu_rows(menu)));
        }

        let sent = request.await.map_err(|e| ConfabError::Transport {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(MessageRef(sent.id.0.to_string()))
    }

    async fn delete(&self, user_id: &str, message: &MessageRef) -> Result<bool, ConfabError> {
        let chat_id = parse_chat_id(user_id)?;
        let message_id = message
            .0
            .parse::<i32>()
            .map(teloxide::types::MessageId)
            .map_err(|e| ConfabError::Transport {
                message: format!("invalid message ref: {e}"),
                source: None,
            })?;

        match self.bot.delete_message(chat_id, message_id).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err_str = e.to_string();
                // Already removed or past the platform's deletion window:
                // not a transport fault.
                if err_str.contains("message to delete not found")
                    || err_str.contains("message can't be deleted")
                {
                    debug!(chat_id = chat_id.0, message = %message, "message already gone");
                    Ok(false)
                } else {
                    Err(ConfabError::Transport {
                        message: format!("failed to delete message: {e}"),
                        source: Some(Box::new(e)),
                    })
                }
            }
        }
    }

    async fn fetch_file(&self, file: &FileRef) -> Result<Vec<u8>, ConfabError> {
        media::download_file(&self.bot, &file.0).await
    }

    async fn receive(&self) -> Result<InboundEvent, ConfabError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(ConfabError::TransportClosed)
    }
}

/// Message endpoint: filter to authorized DMs, normalize, forward.
async fn on_message(msg: Message, state: Arc<PollState>) -> ResponseResult<()> {
    if !handler::is_dm(&msg) {
        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
        return Ok(());
    }

    if !handler::is_authorized(&msg, &state.allowed_users) {
        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
        return Ok(());
    }

    let event = handler::to_inbound_event(&msg);
    if state.tx.send(event).await.is_err() {
        warn!("inbound channel closed, dropping message");
    }

    Ok(())
}

/// Callback endpoint: deposit buttons become invoices.
async fn on_callback(bot: Bot, query: CallbackQuery, state: Arc<PollState>) -> ResponseResult<()> {
    let user_id = query.from.id.0 as i64;
    if !state.allowed_users.is_empty() && !state.allowed_users.contains(&user_id) {
        debug!(user_id, "ignoring callback from unauthorized user");
        bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    }

    payments::on_deposit_callback(&bot, &query, &state.payments).await
}

/// Precheckout endpoint: approve only invoices this bot issued.
async fn on_pre_checkout(
    bot: Bot,
    query: PreCheckoutQuery,
    state: Arc<PollState>,
) -> ResponseResult<()> {
    payments::on_pre_checkout(&bot, &query, &state.payments).await
}

/// A user id is the DM chat id, as issued by this transport.
fn parse_chat_id(user_id: &str) -> Result<ChatId, ConfabError> {
    user_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| ConfabError::Transport {
            message: format!("invalid chat id: {e}"),
            source: None,
        })
}

/// Lays the deposit options out as button rows, two per row.
fn menu_rows(options: &[PriceOption]) -> Vec<Vec<InlineKeyboardButton>> {
    options
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|option| {
                    InlineKeyboardButton::callback(
                        option.label.clone(),
                        format!("deposit:{}", option.amount_minor),
                    )
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_bot_token() {
        let config = TelegramConfig {
            bot_token: None,
            allowed_users: vec![],
        };
        assert!(TelegramTransport::new(config, PaymentsConfig::default()).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        let config = TelegramConfig {
            bot_token: Some(String::new()),
            allowed_users: vec![],
        };
        assert!(TelegramTransport::new(config, PaymentsConfig::default()).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let config = TelegramConfig {
            bot_token: Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11".into()),
            allowed_users: vec![12345],
        };
        assert!(TelegramTransport::new(config, PaymentsConfig::default()).is_ok());
    }

    #[test]
    fn parse_chat_id_requires_numeric_ids() {
        assert_eq!(parse_chat_id("12345").unwrap(), ChatId(12345));
        assert!(parse_chat_id("telegram").is_err());
    }

    #[test]
    fn menu_rows_chunk_two_buttons_per_row() {
        let options = vec![
            PriceOption {
                label: "$10".into(),
                amount_minor: 1000,
            },
            PriceOption {
                label: "$20".into(),
                amount_minor: 2000,
            },
            PriceOption {
                label: "$30".into(),
                amount_minor: 3000,
            },
        ];

        let rows = menu_rows(&options);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn plugin_adapter_metadata() {
        let config = TelegramConfig {
            bot_token: Some("test:token".into()),
            allowed_users: vec![],
        };
        let transport = TelegramTransport::new(config, PaymentsConfig::default()).unwrap();
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.version(), semver::Version::new(0, 1, 0));
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }
}
